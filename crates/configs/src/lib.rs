//! configs
//!
//! Layered runtime settings: built-in defaults, then an optional
//! `config/default.toml`, then `BLOG__*` environment variables (a `.env`
//! file is loaded first when present). `BLOG__DATABASE__URL` maps to
//! `database.url`.

use domains::DiscoveryLimits;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "BLOG";
const DEFAULT_FILE: &str = "config/default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub discovery: DiscoveryLimits,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// May embed credentials for networked backends.
    pub url: SecretString,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: SecretString::from("sqlite::memory:"),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { filter: "info".into(), json: false }
    }
}

impl Settings {
    /// Reads `.env`, the optional settings file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let builder = config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    /// Parses TOML on top of the defaults. No file or environment lookups.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }

        let d = &self.discovery;
        if d.max_page_size == 0 {
            return Err(ConfigError::Invalid("discovery.max_page_size must be at least 1".into()));
        }
        if d.default_page_size == 0 || d.default_page_size > d.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "discovery.default_page_size must be between 1 and {}",
                d.max_page_size
            )));
        }
        for (name, value) in [
            ("top_tags", d.top_tags),
            ("top_contributors", d.top_contributors),
            ("top_posts", d.top_posts),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("discovery.{name} must be at least 1")));
            }
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log.filter must not be empty".into()));
        }
        Ok(())
    }
}
