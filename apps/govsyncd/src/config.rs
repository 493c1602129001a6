//! Runner configuration from environment variables.
//!
//! Loads a `.env` file when present (development convenience), then
//! validates everything up front so a misconfigured deployment fails
//! fast instead of half-running.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use govsync_engine::EngineConfig;

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// An environment variable has an unusable value.
    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Maximum Postgres connections in the pool.
    pub max_db_connections: u32,
    /// Root of the JSON snapshot directory the feeds read from.
    pub feed_dir: PathBuf,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Engine tunables.
    pub engine: EngineConfig,
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

fn optional_parsed<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                var,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Development convenience; absent .env files are fine.
        dotenvy::dotenv().ok();

        let mut engine = EngineConfig::default();
        if let Some(limit) = optional_parsed::<usize>("MAX_CONCURRENT_SCOPES")? {
            engine.max_concurrent_scopes = limit;
        }
        if let Some(threshold) = optional_parsed::<usize>("RICH_PAYLOAD_MIN_BYTES")? {
            engine.rich_payload_min_bytes = threshold;
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            max_db_connections: optional_parsed::<u32>("MAX_DB_CONNECTIONS")?.unwrap_or(5),
            feed_dir: PathBuf::from(required("FEED_DIR")?),
            log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
            engine,
        })
    }
}
