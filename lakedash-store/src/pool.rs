//! Pooled connections to the Lakebase Postgres instance.
//!
//! The pool manager issues a freshly obtained short-lived access token as the
//! password for every new physical connection. Tokens are never reused across
//! connection establishments, and the provider is invoked at connect time,
//! not per query. Recycled connections are validated before reuse.

use std::sync::Arc;
use std::time::Duration;

use deadpool::managed::{Manager, Metrics, RecycleError, RecycleResult};
use lakedash_core::TokenProvider;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::config::SslMode;
use tokio_postgres::Client;
use tracing::debug;

use crate::error::StoreError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const APPLICATION_NAME: &str = "lakedash";

/// Connection location and identity. There is no password field:
/// credentials come from the [`TokenProvider`] at connect time.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
}

impl StoreConfig {
    /// Build from the standard `PGHOST` / `PGPORT` / `PGDATABASE` / `PGUSER`
    /// environment variables. `PGPORT` defaults to 5432.
    pub fn from_env() -> Result<Self, StoreError> {
        let host = env_non_empty("PGHOST");
        let database = env_non_empty("PGDATABASE");
        let user = env_non_empty("PGUSER");

        let port = match env_non_empty("PGPORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| StoreError::InvalidSetting {
                name: "PGPORT",
                reason: format!("expected a port number, got {raw:?}"),
            })?,
            None => 5432,
        };

        let config = Self {
            host: host.unwrap_or_default(),
            port,
            database: database.unwrap_or_default(),
            user: user.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail fast when a required location/identity parameter is absent.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut missing: Vec<String> = [
            ("PGHOST", &self.host),
            ("PGDATABASE", &self.database),
            ("PGUSER", &self.user),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort();
            Err(StoreError::Configuration { missing })
        }
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// deadpool manager that dials Postgres with a per-connection token.
pub struct LakebaseManager {
    config: StoreConfig,
    credentials: Arc<dyn TokenProvider>,
    tls: MakeTlsConnector,
}

impl LakebaseManager {
    pub fn new(
        config: StoreConfig,
        credentials: Arc<dyn TokenProvider>,
    ) -> Result<Self, StoreError> {
        let connector = native_tls::TlsConnector::builder().build()?;
        Ok(Self {
            config,
            credentials,
            tls: MakeTlsConnector::new(connector),
        })
    }

    fn pg_config(&self, token: &str) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.user)
            .password(token)
            .dbname(&self.config.database)
            .ssl_mode(SslMode::Prefer)
            .connect_timeout(CONNECT_TIMEOUT)
            .application_name(APPLICATION_NAME);
        pg
    }
}

impl Manager for LakebaseManager {
    type Type = Client;
    type Error = StoreError;

    async fn create(&self) -> Result<Client, StoreError> {
        // One token per physical connection, obtained at connect time.
        let token = self
            .credentials
            .obtain_token()
            .await
            .map_err(StoreError::Token)?;

        let (client, connection) = self.pg_config(&token).connect(self.tls.clone()).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!(error = %err, "postgres connection task ended");
            }
        });

        debug!(
            host = %self.config.host,
            database = %self.config.database,
            "established database connection"
        );
        Ok(client)
    }

    async fn recycle(&self, client: &mut Client, _: &Metrics) -> RecycleResult<StoreError> {
        if client.is_closed() {
            return Err(RecycleError::Backend(StoreError::StaleConnection));
        }
        // Validate the connection before handing it out again.
        client
            .simple_query("select 1")
            .await
            .map_err(|err| RecycleError::Backend(StoreError::Postgres(err)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_passes_for_a_complete_config() {
        let config = StoreConfig {
            host: "instance.database.cloud".to_string(),
            port: 5432,
            database: "databricks_postgres".to_string(),
            user: "app@example.com".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_reports_all_missing_parameters_sorted() {
        let config = StoreConfig {
            host: String::new(),
            port: 5432,
            database: "  ".to_string(),
            user: "app@example.com".to_string(),
        };

        match config.validate() {
            Err(StoreError::Configuration { missing }) => {
                assert_eq!(missing, vec!["PGDATABASE", "PGHOST"]);
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }
}
