//! Settings for the `cashbook` binary, read from `settings.toml` in the
//! working directory and overridden by `CASHBOOK_*` environment variables
//! (e.g. `CASHBOOK_SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    String::from("info")
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Size of the change feed buffer per subscriber.
    pub event_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("CASHBOOK")
                        .prefix_separator("_")
                        .separator("__"),
                )
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(raw: &str) -> Result<Settings, ConfigError> {
        Settings::from_config(
            Config::builder()
                .add_source(File::from_str(raw, FileFormat::Toml))
                .build()?,
        )
    }

    #[test]
    fn sqlite_database() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "cashbook.db" }
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.port, 3000);
        assert!(settings.server.bind.is_none());
        assert_eq!(
            settings.server.database,
            Database::Sqlite(String::from("cashbook.db"))
        );
    }

    #[test]
    fn memory_database_and_default_level() {
        let settings = parse(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 8080
            database = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(settings.server.database, Database::Memory);
    }

    #[test]
    fn missing_server_section_is_an_error() {
        assert!(parse("[app]\nlevel = \"info\"\n").is_err());
    }
}
