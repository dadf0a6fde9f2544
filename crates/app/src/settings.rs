//! Handles settings for the application.
//!
//! Values come, in increasing priority, from the built-in defaults, the TOML
//! file (`config/doscores.toml` unless `--config` says otherwise), `DOSCORES_*`
//! environment variables (`__` separates sections, e.g.
//! `DOSCORES_SERVER__SYNC_KEY`) and the command line.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use engine::StandardFees;
use forum::ForumSettings;
use serde::Deserialize;
use server::ServerSettings;

const DEFAULT_CONFIG_PATH: &str = "config/doscores.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub database: Database,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            database: Database::Sqlite("doscores.db".to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: ServerSettings,
    pub fees: StandardFees,
    pub forum: ForumSettings,
}

#[derive(Debug, Parser)]
#[command(name = "doscores", version)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    level: Option<String>,
    /// Override the listening address (e.g. 0.0.0.0:8080).
    #[arg(long)]
    bind: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();

        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings = Self::from_sources(
            Config::builder()
                .add_source(File::with_name(config_path).required(args.config.is_some()))
                .add_source(
                    Environment::with_prefix("DOSCORES")
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )?;

        if let Some(level) = args.level {
            settings.app.level = level;
        }
        if let Some(bind) = args.bind {
            settings.server.bind = bind;
        }

        Ok(settings)
    }

    fn from_sources(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_sources(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.app.database.url(), "sqlite:doscores.db?mode=rwc");
        assert_eq!(settings.fees, StandardFees::default());
        assert_eq!(settings.server, ServerSettings::default());
        assert_eq!(settings.forum, ForumSettings::default());
    }

    #[test]
    fn sections_override_defaults() {
        let settings = parse(
            r#"
            [app]
            level = "debug"
            database = "memory"

            [server]
            public_url = "https://points.example"
            sync_key = "s3cret"

            [fees]
            transfer_bps = 500

            [forum]
            proxy = "http://127.0.0.1:8118"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.app.database, Database::Memory);
        assert_eq!(settings.server.public_url, "https://points.example");
        assert_eq!(settings.server.sync_key, "s3cret");
        assert_eq!(settings.server.bind, ServerSettings::default().bind);
        assert_eq!(settings.fees.transfer_bps, 500);
        assert_eq!(settings.fees.consumption_bps, 300);
        assert_eq!(settings.forum.proxy.as_deref(), Some("http://127.0.0.1:8118"));
    }
}
