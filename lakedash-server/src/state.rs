//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lakedash_core::TokenProvider;
use lakedash_store::ConfigStore;

/// Shared application state. The config store (and its pool) is built once
/// by the process entry point and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: ConfigStore,
    credentials: Arc<dyn TokenProvider>,
    start_time: Instant,
}

impl AppState {
    pub fn new(store: ConfigStore, credentials: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                credentials,
                start_time: Instant::now(),
            }),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.inner.store
    }

    pub fn credentials(&self) -> Arc<dyn TokenProvider> {
        self.inner.credentials.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.inner.start_time.elapsed()
    }
}
