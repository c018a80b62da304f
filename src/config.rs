//! Store configuration.
//!
//! Configuration is read from environment variables:
//! - `DATABASE_URL` - Required. `PostgreSQL` connection URL.
//! - `TASKTRACKER_POOL_SIZE` - Optional. Maximum pooled connections. Defaults to `10`.
//! - `TASKTRACKER_CONNECTION_TIMEOUT_SECS` - Optional. Seconds to wait for a
//!   pooled connection. Defaults to `30`.

use crate::task::adapters::postgres::TaskPgPool;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading configuration or building the pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Parse failure description.
        reason: String,
    },

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Connection settings for the `PostgreSQL` task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStoreConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum number of pooled connections.
    pub max_pool_size: u32,
    /// Upper bound on waiting for a pooled connection.
    pub connection_timeout: Duration,
}

impl TaskStoreConfig {
    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` is not set and
    /// [`ConfigError::InvalidValue`] if an optional variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`TaskStoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_owned()))?;

        let max_pool_size = parse_or(&lookup, "TASKTRACKER_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if max_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "TASKTRACKER_POOL_SIZE".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        let timeout_secs = parse_or(
            &lookup,
            "TASKTRACKER_CONNECTION_TIMEOUT_SECS",
            DEFAULT_CONNECTION_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            max_pool_size,
            connection_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Builds the r2d2 connection pool used by
    /// [`crate::task::adapters::postgres::PostgresTaskRepository`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the pool cannot establish its
    /// initial connections.
    pub fn build_pool(&self) -> Result<TaskPgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.database_url.as_str());
        let pool = Pool::builder()
            .max_size(self.max_pool_size)
            .connection_timeout(self.connection_timeout)
            .build(manager)?;
        tracing::info!(
            max_pool_size = self.max_pool_size,
            timeout_secs = self.connection_timeout.as_secs(),
            "task store pool ready"
        );
        Ok(pool)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            name: name.to_owned(),
            reason: err.to_string(),
        })
    })
}
