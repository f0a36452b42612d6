//! Structured error types for the config store.
//!
//! The taxonomy separates fatal construction-time misconfiguration from
//! propagated transport errors. "Key not found" and "table not created yet"
//! are not errors at all: reads return `Option` for those.

use thiserror::Error;

/// Result type alias for config store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Required connection parameters absent at construction time.
    #[error("missing required connection settings: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    /// A present connection parameter that cannot be used.
    #[error("invalid connection setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// Key or value outside the table's column limits.
    #[error("invalid config entry: {0}")]
    InvalidEntry(String),

    /// The token provider failed; surfaces as a connection error.
    #[error("failed to obtain database access token: {0}")]
    Token(#[source] anyhow::Error),

    /// TLS connector initialization failed.
    #[error("tls initialization failed: {0}")]
    Tls(#[from] native_tls::Error),

    /// Transport, auth, or query failure. Propagated, never swallowed.
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Pool-level failure (exhaustion, closed pool).
    #[error("connection pool error: {0}")]
    Pool(String),

    /// A pooled connection turned out to be dead during recycling.
    #[error("pooled connection is no longer usable")]
    StaleConnection,
}

impl From<deadpool::managed::PoolError<StoreError>> for StoreError {
    fn from(err: deadpool::managed::PoolError<StoreError>) -> Self {
        match err {
            deadpool::managed::PoolError::Backend(inner) => inner,
            other => StoreError::Pool(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_lists_missing_variables() {
        let err = StoreError::Configuration {
            missing: vec!["PGDATABASE".to_string(), "PGHOST".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required connection settings: PGDATABASE, PGHOST"
        );
    }

    #[test]
    fn pool_backend_errors_unwrap_to_the_inner_error() {
        let err: StoreError = deadpool::managed::PoolError::Backend(StoreError::InvalidEntry(
            "key must not be empty".to_string(),
        ))
        .into();
        assert!(matches!(err, StoreError::InvalidEntry(_)));
    }
}
