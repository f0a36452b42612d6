//! The key/value config store.
//!
//! A two-column table (`app_config`) holding a handful of dashboard
//! configuration overrides. Writes upsert; reads tolerate the table not
//! existing yet. The store owns its connection pool and is built once by the
//! process entry point, then passed to whatever needs it.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool::managed::Pool;
use lakedash_core::{SettingsSource, TokenProvider};
use tokio_postgres::error::SqlState;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::pool::{LakebaseManager, StoreConfig};

/// Maximum key length, matching the `varchar(32)` column.
pub const MAX_KEY_LEN: usize = 32;
/// Maximum value length, matching the `varchar(255)` column.
pub const MAX_VALUE_LEN: usize = 255;

const MAX_POOL_SIZE: usize = 4;

const CREATE_CONFIG_TABLE: &str = "create table if not exists app_config (\
     key varchar(32) primary key, \
     value varchar(255) not null)";

const UPSERT_CONFIG: &str = "insert into app_config (key, value) values ($1, $2) \
     on conflict (key) do update set value = excluded.value";

const SELECT_CONFIG: &str = "select value from app_config where key = $1";

/// Connection pool type for the config store.
pub type StorePool = Pool<LakebaseManager>;

/// Key/value config store backed by Lakebase Postgres.
///
/// Cloning is cheap (the pool is shared); connections are established lazily
/// on first use.
#[derive(Clone)]
pub struct ConfigStore {
    pool: StorePool,
    user: String,
}

impl ConfigStore {
    /// Build a store from explicit configuration. Fails fast when required
    /// connection parameters are absent; does not touch the network.
    pub fn new(config: StoreConfig, credentials: Arc<dyn TokenProvider>) -> Result<Self> {
        config.validate()?;
        let user = config.user.clone();
        let manager = LakebaseManager::new(config, credentials)?;
        let pool = StorePool::builder(manager)
            .max_size(MAX_POOL_SIZE)
            .build()
            .map_err(|err| StoreError::Pool(err.to_string()))?;
        Ok(Self { pool, user })
    }

    /// Build a store from `PG*` environment variables.
    pub fn from_env(credentials: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::new(StoreConfig::from_env()?, credentials)
    }

    /// Upsert a config entry. Creates the backing table on first write; the
    /// create and the upsert run in a single transaction.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_entry(key, value)?;

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        tx.batch_execute(CREATE_CONFIG_TABLE).await?;
        tx.execute(UPSERT_CONFIG, &[&key, &value]).await?;
        tx.commit().await?;

        debug!(key, "persisted config entry");
        Ok(())
    }

    /// Read a config entry. A key that was never written, or a read before
    /// the table exists, is `None`; every other failure is an error.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let client = self.pool.get().await?;
        match client.query_opt(SELECT_CONFIG, &[&key]).await {
            Ok(row) => Ok(row.map(|row| row.get(0))),
            Err(err) if is_undefined_table(&err) => {
                debug!(key, "config table does not exist yet");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Connectivity probe: the server version (first two words) and the
    /// connecting role.
    pub async fn version(&self) -> Result<String> {
        let client = self.pool.get().await?;
        let row = client.query_one("select version()", &[]).await?;
        let banner: String = row.get(0);
        let short = banner
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("{} {}", short, self.user))
    }

    /// The underlying connection pool (escape hatch for maintenance tasks).
    ///
    /// Prefer the typed methods.
    pub fn pool(&self) -> &StorePool {
        &self.pool
    }
}

#[async_trait]
impl SettingsSource for ConfigStore {
    async fn fetch(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(key).await?)
    }
}

fn is_undefined_table(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNDEFINED_TABLE)
}

fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidEntry("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidEntry(format!(
            "key {key:?} exceeds {MAX_KEY_LEN} bytes"
        )));
    }
    if value.len() > MAX_VALUE_LEN {
        return Err(StoreError::InvalidEntry(format!(
            "value for key {key:?} exceeds {MAX_VALUE_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakedash_core::StaticTokenProvider;

    #[test]
    fn entries_within_column_limits_are_accepted() {
        assert!(validate_entry("workspace", "adb-123.cloud").is_ok());
        assert!(validate_entry(&"k".repeat(32), &"v".repeat(255)).is_ok());
    }

    #[test]
    fn oversized_keys_and_values_are_rejected_before_any_io() {
        assert!(matches!(
            validate_entry(&"k".repeat(33), "v"),
            Err(StoreError::InvalidEntry(_))
        ));
        assert!(matches!(
            validate_entry("k", &"v".repeat(256)),
            Err(StoreError::InvalidEntry(_))
        ));
        assert!(matches!(
            validate_entry("", "v"),
            Err(StoreError::InvalidEntry(_))
        ));
    }

    #[test]
    fn store_construction_fails_fast_on_missing_parameters() {
        let config = StoreConfig {
            host: String::new(),
            port: 5432,
            database: String::new(),
            user: String::new(),
        };
        let result = ConfigStore::new(
            config,
            Arc::new(StaticTokenProvider("token".to_string())),
        );
        assert!(matches!(
            result,
            Err(StoreError::Configuration { .. })
        ));
    }

    // Live tests run against a real Postgres; provide PGHOST / PGDATABASE /
    // PGUSER / PGPASSWORD and run with `cargo test -- --ignored`.

    fn live_store() -> ConfigStore {
        let config = StoreConfig::from_env().expect("PG* env vars must be set for live tests");
        let token = std::env::var("PGPASSWORD").unwrap_or_default();
        ConfigStore::new(config, Arc::new(StaticTokenProvider(token))).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a reachable Postgres (set PGHOST/PGDATABASE/PGUSER/PGPASSWORD)"]
    async fn set_then_get_roundtrip() {
        let store = live_store();
        store.set("feature_flag", "on").await.unwrap();
        assert_eq!(
            store.get("feature_flag").await.unwrap().as_deref(),
            Some("on")
        );
    }

    #[tokio::test]
    #[ignore = "requires a reachable Postgres (set PGHOST/PGDATABASE/PGUSER/PGPASSWORD)"]
    async fn set_overwrites_existing_value() {
        let store = live_store();
        store.set("workspace", "a").await.unwrap();
        store.set("workspace", "b").await.unwrap();
        assert_eq!(store.get("workspace").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    #[ignore = "requires a reachable Postgres (set PGHOST/PGDATABASE/PGUSER/PGPASSWORD)"]
    async fn get_missing_key_returns_absent() {
        let store = live_store();
        // Ensure the table exists without writing the probed key.
        store.set("feature_flag", "on").await.unwrap();
        assert_eq!(store.get("missing_key").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a reachable Postgres (set PGHOST/PGDATABASE/PGUSER/PGPASSWORD)"]
    async fn get_before_table_exists_returns_absent() {
        let store = live_store();
        let client = store.pool().get().await.unwrap();
        client
            .batch_execute("drop table if exists app_config")
            .await
            .unwrap();
        drop(client);

        assert_eq!(store.get("warehouse").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a reachable Postgres (set PGHOST/PGDATABASE/PGUSER/PGPASSWORD)"]
    async fn version_reports_server_and_role() {
        let store = live_store();
        let version = store.version().await.unwrap();
        assert!(version.starts_with("PostgreSQL"));
    }
}
