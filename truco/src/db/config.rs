//! Database configuration.

use std::{env, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DatabaseConfigError {
    #[error("missing required environment variable: {0}")]
    MissingUrl(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, DatabaseConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| DatabaseConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl DatabaseConfig {
    /// Read the pool settings from the environment.
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: acquire timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is unset or a numeric setting does not parse.
    pub fn from_env() -> Result<Self, DatabaseConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| DatabaseConfigError::MissingUrl("DATABASE_URL"))?;
        Self::with_url(database_url)
    }

    /// Like [`DatabaseConfig::from_env`] but with an explicit URL.
    ///
    /// # Errors
    ///
    /// Fails when a numeric setting does not parse.
    pub fn with_url(database_url: impl Into<String>) -> Result<Self, DatabaseConfigError> {
        let defaults = Self::development();
        Ok(Self {
            database_url: database_url.into(),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: env_or(
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
            max_lifetime_secs: env_or("DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
        })
    }

    /// Local development defaults against `postgres://postgres@localhost/truco`.
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/truco".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}
