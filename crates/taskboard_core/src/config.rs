//! Runtime configuration for the task board server.
//!
//! # Responsibility
//! - Resolve server, storage and logging settings from environment variables.
//! - Reject malformed values instead of silently defaulting them.
//!
//! # Invariants
//! - Unset or blank variables fall back to documented defaults.
//! - `DATABASE_PATH=:memory:` selects an in-memory database.

use crate::db::{DbSource, PoolOptions};
use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_PATH: &str = "taskboard.sqlite3";
const MEMORY_DATABASE_PATH: &str = ":memory:";

/// Deployment environment; controls how much error detail leaves the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Configuration error raised while reading the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    OutOfRange { key: &'static str, value: String },
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a number, got `{value}`")
            }
            Self::OutOfRange { key, value } => write!(f, "{key} is out of range: `{value}`"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub pool: PoolOptions,
    pub log_level: &'static str,
    /// Rolling log files are written here when set; stderr only otherwise.
    pub log_dir: Option<PathBuf>,
    pub environment: AppEnvironment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            pool: PoolOptions::default(),
            log_level: default_log_level(),
            log_dir: None,
            environment: AppEnvironment::default(),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Recognized keys: `HOST`, `PORT`, `DATABASE_PATH`, `DB_POOL_MAX`,
    /// `DB_ACQUIRE_TIMEOUT_MS`, `LOG_LEVEL`, `LOG_DIR`, `APP_ENV`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(host) = read("HOST") {
            config.host = host;
        }
        if let Some(port) = read("PORT") {
            config.port = parse_number::<u16>("PORT", &port)?;
        }
        if let Some(path) = read("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(max) = read("DB_POOL_MAX") {
            let max_size = parse_number::<usize>("DB_POOL_MAX", &max)?;
            if max_size == 0 {
                return Err(ConfigError::OutOfRange {
                    key: "DB_POOL_MAX",
                    value: max,
                });
            }
            config.pool.max_size = max_size;
        }
        if let Some(timeout) = read("DB_ACQUIRE_TIMEOUT_MS") {
            let millis = parse_number::<u64>("DB_ACQUIRE_TIMEOUT_MS", &timeout)?;
            config.pool.acquire_timeout = Duration::from_millis(millis);
        }
        if let Some(level) = read("LOG_LEVEL") {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        config.log_dir = read("LOG_DIR").map(PathBuf::from);
        if let Some(environment) = read("APP_ENV") {
            config.environment = AppEnvironment::parse(&environment);
        }

        Ok(config)
    }

    /// Returns the storage source selected by `database_path`.
    pub fn db_source(&self) -> DbSource {
        if self.database_path.as_os_str() == MEMORY_DATABASE_PATH {
            DbSource::Memory
        } else {
            DbSource::File(self.database_path.clone())
        }
    }

    /// Returns `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}
