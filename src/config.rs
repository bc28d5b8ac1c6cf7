//! Service configuration, read from the environment (and `.env` via `dotenv`).
//!
//! - `DATABASE_URL` - SQLite database path. Defaults to `kanban.sqlite3`.
//! - `DATABASE_POOL_SIZE` - Maximum pooled connections. Defaults to `8`.
//! - `DATABASE_BUSY_TIMEOUT_MS` - How long a writer waits for the lock. Defaults to `5000`.
//! - `HOST` - Bind host. Defaults to `127.0.0.1`.
//! - `PORT` - Bind port. Defaults to `8000`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "kanban.sqlite3".to_string(),
            pool_size: 8,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = DatabaseConfig::default();

        let pool_size = parse_var("DATABASE_POOL_SIZE", defaults.pool_size)?;
        if pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_POOL_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or(defaults.url),
            pool_size,
            busy_timeout: Duration::from_millis(parse_var("DATABASE_BUSY_TIMEOUT_MS", 5000u64)?),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8000)?,
            database,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
