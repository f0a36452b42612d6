//! lakedash-store: key/value config store on Lakebase Postgres
//!
//! A small persisted override table for dashboard connection settings:
//! upsert-write, miss-tolerant read, pooled connections that authenticate
//! with a freshly obtained short-lived token per physical connection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lakedash_core::credentials_from_env;
//! use lakedash_store::ConfigStore;
//!
//! let store = ConfigStore::from_env(credentials_from_env()?)?;
//! store.set("workspace", "adb-123.cloud").await?;
//! let host = store.get("workspace").await?; // Some("adb-123.cloud")
//! ```

mod error;
mod pool;
mod store;

pub use error::{Result, StoreError};
pub use pool::{LakebaseManager, StoreConfig};
pub use store::{ConfigStore, StorePool, MAX_KEY_LEN, MAX_VALUE_LEN};
