//! Initial schema.
//!
//! - `businesses`: tenants, each with one currency
//! - `memberships`: `(business_id, user_id) -> role`
//! - `books`: entry groupings with denormalized totals
//! - `counterparties`: customers and vendors with denormalized totals
//! - `entries`: single cash movements, each owned by one book

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Businesses {
    Table,
    Id,
    Name,
    Currency,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
enum Memberships {
    Table,
    BusinessId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Books {
    Table,
    Id,
    BusinessId,
    Name,
    TotalIn,
    TotalOut,
    NetBalance,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum Counterparties {
    Table,
    Id,
    BusinessId,
    Name,
    Kind,
    Phone,
    TotalIn,
    TotalOut,
    Balance,
    CreatedAt,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    BusinessId,
    BookId,
    CounterpartyId,
    Direction,
    AmountMinor,
    OccurredAt,
    Remark,
    Category,
    PaymentMode,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Businesses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Businesses::Name).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Businesses::OwnerId).string().not_null())
                    .col(ColumnDef::new(Businesses::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Memberships::BusinessId).string().not_null())
                    .col(ColumnDef::new(Memberships::UserId).string().not_null())
                    .col(ColumnDef::new(Memberships::Role).string().not_null())
                    .col(ColumnDef::new(Memberships::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(Memberships::BusinessId)
                            .col(Memberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-memberships-business_id")
                            .from(Memberships::Table, Memberships::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-memberships-user_id")
                    .table(Memberships::Table)
                    .col(Memberships::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Books
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Books::BusinessId).string().not_null())
                    .col(ColumnDef::new(Books::Name).string().not_null())
                    .col(
                        ColumnDef::new(Books::TotalIn)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Books::TotalOut)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Books::NetBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Books::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Books::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-books-business_id")
                            .from(Books::Table, Books::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-business_id")
                    .table(Books::Table)
                    .col(Books::BusinessId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Counterparties
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Counterparties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counterparties::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Counterparties::BusinessId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Counterparties::Name).string().not_null())
                    .col(ColumnDef::new(Counterparties::Kind).string().not_null())
                    .col(ColumnDef::new(Counterparties::Phone).string())
                    .col(
                        ColumnDef::new(Counterparties::TotalIn)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Counterparties::TotalOut)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Counterparties::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Counterparties::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-counterparties-business_id")
                            .from(Counterparties::Table, Counterparties::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-counterparties-business_id-kind")
                    .table(Counterparties::Table)
                    .col(Counterparties::BusinessId)
                    .col(Counterparties::Kind)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::BusinessId).string().not_null())
                    .col(ColumnDef::new(Entries::BookId).string().not_null())
                    .col(ColumnDef::new(Entries::CounterpartyId).string())
                    .col(ColumnDef::new(Entries::Direction).string().not_null())
                    .col(ColumnDef::new(Entries::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Entries::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Entries::Remark).string())
                    .col(ColumnDef::new(Entries::Category).string())
                    .col(ColumnDef::new(Entries::PaymentMode).string())
                    .col(ColumnDef::new(Entries::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Entries::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Entries::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Entries::UpdatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Entries::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-business_id")
                            .from(Entries::Table, Entries::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-book_id")
                            .from(Entries::Table, Entries::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-counterparty_id")
                            .from(Entries::Table, Entries::CounterpartyId)
                            .to(Counterparties::Table, Counterparties::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-book_id-occurred_at")
                    .table(Entries::Table)
                    .col(Entries::BookId)
                    .col(Entries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-business_id-occurred_at")
                    .table(Entries::Table)
                    .col(Entries::BusinessId)
                    .col(Entries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-counterparty_id")
                    .table(Entries::Table)
                    .col(Entries::CounterpartyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation (FK dependencies)
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Counterparties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await?;
        Ok(())
    }
}
