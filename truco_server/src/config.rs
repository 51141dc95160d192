//! Server configuration management.
//!
//! Consolidates every environment variable read and applies command line
//! overrides on top.

use std::{fmt, net::SocketAddr, str::FromStr};
use truco::{
    DEFAULT_POINTS_TO_WIN,
    db::{DatabaseConfig, DatabaseConfigError},
};

/// Where matches are stored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StorageBackend {
    /// Process memory; matches are lost on restart
    #[default]
    Memory,
    /// PostgreSQL through `DATABASE_URL`
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub storage: Option<StorageBackend>,
    pub database_url: Option<String>,
    pub points_to_win: Option<u32>,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Match storage
    pub storage: StorageBackend,
    /// Pool settings, present only for PostgreSQL storage
    pub database: Option<DatabaseConfig>,
    /// Threshold used when `create-match` omits one
    pub default_points_to_win: u32,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SERVER_BIND` (default `127.0.0.1:6969`)
    /// - `STORAGE` (`memory` or `postgres`, default `memory`)
    /// - `DATABASE_URL` (required for `postgres`)
    /// - `POINTS_TO_WIN` (default 12)
    /// - `METRICS_BIND` (optional)
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(
        overrides: Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_var(&lookup, "SERVER_BIND")?.unwrap_or(default_bind()),
        };

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => parse_var(&lookup, "STORAGE")?.unwrap_or_default(),
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => {
                let url = overrides
                    .database_url
                    .or_else(|| lookup("DATABASE_URL"))
                    .ok_or_else(|| ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Required with --storage postgres, e.g. postgres://postgres@localhost/truco"
                            .to_string(),
                    })?;
                Some(DatabaseConfig::with_url(url)?)
            }
        };

        let default_points_to_win = match overrides.points_to_win {
            Some(points) => points,
            None => parse_var(&lookup, "POINTS_TO_WIN")?.unwrap_or(DEFAULT_POINTS_TO_WIN),
        };

        let metrics_bind = parse_var(&lookup, "METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            storage,
            database,
            default_points_to_win,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_points_to_win == 0 {
            return Err(ConfigError::Invalid {
                var: "POINTS_TO_WIN".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        if let Some(database) = &self.database
            && database.min_connections > database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseConfigError),
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Parse a variable if it is set. A set but malformed value is an error.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{value:?}: {e}"),
            }),
    }
}
