use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "cashbook_admin")]
#[command(about = "Admin utilities for Cashbook (bootstrap businesses, repair totals)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./cashbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations and exit.
    Migrate,
    Business(Business),
    Member(Member),
    /// Rebuild book and counterparty totals from the stored entries.
    Recompute(RecomputeArgs),
}

#[derive(Args, Debug)]
struct Business {
    #[command(subcommand)]
    command: BusinessCommand,
}

#[derive(Subcommand, Debug)]
enum BusinessCommand {
    Create(BusinessCreateArgs),
    List(BusinessListArgs),
}

#[derive(Args, Debug)]
struct BusinessCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "INR", value_parser = parse_currency)]
    currency: Currency,
}

#[derive(Args, Debug)]
struct BusinessListArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Set(MemberSetArgs),
    Remove(MemberRemoveArgs),
}

#[derive(Args, Debug)]
struct MemberSetArgs {
    #[arg(long)]
    business: Uuid,
    #[arg(long)]
    user: String,
    #[arg(long, value_parser = parse_role)]
    role: Role,
    /// Owner performing the change.
    #[arg(long = "as")]
    actor: String,
}

#[derive(Args, Debug)]
struct MemberRemoveArgs {
    #[arg(long)]
    business: Uuid,
    #[arg(long)]
    user: String,
    #[arg(long = "as")]
    actor: String,
}

#[derive(Args, Debug)]
struct RecomputeArgs {
    #[arg(long)]
    business: Uuid,
    #[arg(long = "as")]
    actor: String,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("engine=warn")
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Migrate => {
            println!("database is up to date");
        }
        Command::Business(Business {
            command: BusinessCommand::Create(args),
        }) => {
            let id = engine
                .create_business(&args.name, args.currency, &args.owner)
                .await?;
            println!("created business: {id} (owner {})", args.owner);
        }
        Command::Business(Business {
            command: BusinessCommand::List(args),
        }) => {
            for (business, role) in engine.list_businesses(&args.user).await? {
                println!(
                    "{}\t{}\t{}\t{role}",
                    business.id, business.name, business.currency
                );
            }
        }
        Command::Member(Member {
            command: MemberCommand::Set(args),
        }) => {
            engine
                .upsert_member(args.business, &args.user, args.role, &args.actor)
                .await?;
            println!("{} is now {} of {}", args.user, args.role, args.business);
        }
        Command::Member(Member {
            command: MemberCommand::Remove(args),
        }) => {
            engine
                .remove_member(args.business, &args.user, &args.actor)
                .await?;
            println!("removed {} from {}", args.user, args.business);
        }
        Command::Recompute(args) => {
            let corrected = engine
                .recompute_aggregates(args.business, &args.actor)
                .await?;
            println!("recomputed totals, {corrected} aggregate(s) corrected");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_member_set() {
        let business = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "cashbook_admin",
            "--database-url",
            "sqlite::memory:",
            "member",
            "set",
            "--business",
            &business.to_string(),
            "--user",
            "bob",
            "--role",
            "Partner",
            "--as",
            "alice",
        ])
        .unwrap();

        let Command::Member(Member {
            command: MemberCommand::Set(args),
        }) = cli.command
        else {
            panic!("expected member set");
        };
        assert_eq!(args.business, business);
        assert_eq!(args.role, Role::Partner);
        assert_eq!(args.actor, "alice");
    }

    #[test]
    fn rejects_unknown_currency() {
        let err = Cli::try_parse_from([
            "cashbook_admin",
            "business",
            "create",
            "--owner",
            "alice",
            "--name",
            "Shop",
            "--currency",
            "XYZ",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
