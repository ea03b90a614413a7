//! Configuration management for the DustReports server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DUST_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::services::query::EngineSettings;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Source database configuration
    pub database: DatabaseConfig,

    /// Snapshot refresh configuration
    pub refresh: RefreshConfig,

    /// Report engine constants
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL of the source mirror
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Load the snapshot once at startup
    pub on_startup: bool,

    /// Local wall-clock times ("HH:MM") at which the scheduler refreshes
    pub times: Vec<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("DUST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/dust")?
            .set_default("database.max_connections", 4)?
            .set_default("database.min_connections", 0)?
            .set_default("refresh.on_startup", false)?
            .set_default("refresh.times", Vec::<String>::new())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DUST_ prefix)
            .add_source(
                Environment::with_prefix("DUST")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("refresh.times")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
