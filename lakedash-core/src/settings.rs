//! Connection-settings resolution.
//!
//! Effective connection parameters (workspace host, warehouse path) are
//! derived on every request: a value persisted in the config store wins over
//! the environment default, and a failing store read degrades to the
//! environment rather than surfacing an error. This is the only layer that
//! swallows store errors; the store itself reports them faithfully.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Logical connection settings the dashboard needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingName {
    /// Workspace host, e.g. `adb-123.azuredatabricks.net`.
    Workspace,
    /// SQL warehouse HTTP path, e.g. `/sql/1.0/warehouses/abc123`.
    Warehouse,
}

impl SettingName {
    /// Key under which the setting is persisted in the config store.
    pub fn key(&self) -> &'static str {
        match self {
            SettingName::Workspace => "workspace",
            SettingName::Warehouse => "warehouse",
        }
    }

    /// Environment variable consulted when no persisted override exists.
    pub fn env_var(&self) -> &'static str {
        match self {
            SettingName::Workspace => "DATABRICKS_SERVER_HOSTNAME",
            SettingName::Warehouse => "DATABRICKS_HTTP_PATH",
        }
    }
}

/// Read side of the key/value config store, as seen by the resolver.
///
/// The store crate implements this; tests implement it in-memory.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetch the persisted value for `key`, `None` if unset.
    async fn fetch(&self, key: &str) -> anyhow::Result<Option<String>>;
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingProvenance {
    Persisted,
    Environment,
    Unset,
}

/// A resolved setting together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSetting {
    pub value: Option<String>,
    pub source: SettingProvenance,
}

/// Connection parameters derived from store + environment. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConnectionSettings {
    pub workspace_host: Option<String>,
    pub warehouse_path: Option<String>,
}

/// Resolve a single setting: persisted value if present and non-empty, else
/// the environment value, else absent.
pub async fn resolve(source: &dyn SettingsSource, name: SettingName) -> Option<String> {
    resolve_detailed(source, name).await.value
}

/// Like [`resolve`], but reports where the value came from.
pub async fn resolve_detailed(source: &dyn SettingsSource, name: SettingName) -> ResolvedSetting {
    resolve_with(source, name, |var| {
        std::env::var(var).ok().filter(|v| !v.trim().is_empty())
    })
    .await
}

/// Derive the full effective connection settings, freshly, with no caching.
pub async fn resolve_connection_settings(
    source: &dyn SettingsSource,
) -> EffectiveConnectionSettings {
    EffectiveConnectionSettings {
        workspace_host: resolve(source, SettingName::Workspace).await,
        warehouse_path: resolve(source, SettingName::Warehouse).await,
    }
}

async fn resolve_with<F>(source: &dyn SettingsSource, name: SettingName, env: F) -> ResolvedSetting
where
    F: Fn(&str) -> Option<String>,
{
    match source.fetch(name.key()).await {
        Ok(Some(value)) if !value.trim().is_empty() => {
            return ResolvedSetting {
                value: Some(value),
                source: SettingProvenance::Persisted,
            };
        }
        Ok(_) => {}
        Err(err) => {
            // Store unreachable or table missing: fall back to the environment.
            debug!(setting = name.key(), error = %err, "config store read failed");
        }
    }

    match env(name.env_var()) {
        Some(value) => ResolvedSetting {
            value: Some(value),
            source: SettingProvenance::Environment,
        },
        None => ResolvedSetting {
            value: None,
            source: SettingProvenance::Unset,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl SettingsSource for MapSource {
        async fn fetch(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.0.get(key).map(|v| v.to_string()))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SettingsSource for FailingSource {
        async fn fetch(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("relation \"app_config\" does not exist"))
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[tokio::test]
    async fn persisted_value_wins_over_environment() {
        let source = MapSource(HashMap::from([("workspace", "adb-123.cloud")]));
        let env = env_of(&[("DATABRICKS_SERVER_HOSTNAME", "env-host.cloud")]);

        let resolved = resolve_with(&source, SettingName::Workspace, env).await;
        assert_eq!(resolved.value.as_deref(), Some("adb-123.cloud"));
        assert_eq!(resolved.source, SettingProvenance::Persisted);
    }

    #[tokio::test]
    async fn missing_persisted_value_falls_back_to_environment() {
        let source = MapSource(HashMap::new());
        let env = env_of(&[("DATABRICKS_HTTP_PATH", "/sql/1.0/warehouses/abc")]);

        let resolved = resolve_with(&source, SettingName::Warehouse, env).await;
        assert_eq!(resolved.value.as_deref(), Some("/sql/1.0/warehouses/abc"));
        assert_eq!(resolved.source, SettingProvenance::Environment);
    }

    #[tokio::test]
    async fn store_error_degrades_to_environment() {
        let env = env_of(&[("DATABRICKS_SERVER_HOSTNAME", "env-host.cloud")]);

        let resolved = resolve_with(&FailingSource, SettingName::Workspace, env).await;
        assert_eq!(resolved.value.as_deref(), Some("env-host.cloud"));
        assert_eq!(resolved.source, SettingProvenance::Environment);
    }

    #[tokio::test]
    async fn store_error_with_no_environment_is_unset() {
        let resolved = resolve_with(&FailingSource, SettingName::Workspace, |_| None).await;
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.source, SettingProvenance::Unset);
    }

    #[tokio::test]
    async fn empty_persisted_value_is_treated_as_absent() {
        let source = MapSource(HashMap::from([("workspace", "   ")]));
        let env = env_of(&[("DATABRICKS_SERVER_HOSTNAME", "env-host.cloud")]);

        let resolved = resolve_with(&source, SettingName::Workspace, env).await;
        assert_eq!(resolved.value.as_deref(), Some("env-host.cloud"));
        assert_eq!(resolved.source, SettingProvenance::Environment);
    }

    #[tokio::test]
    async fn setting_names_map_to_store_keys_and_env_vars() {
        assert_eq!(SettingName::Workspace.key(), "workspace");
        assert_eq!(SettingName::Warehouse.key(), "warehouse");
        assert_eq!(
            SettingName::Workspace.env_var(),
            "DATABRICKS_SERVER_HOSTNAME"
        );
        assert_eq!(SettingName::Warehouse.env_var(), "DATABRICKS_HTTP_PATH");
    }

    #[tokio::test]
    async fn connection_settings_are_derived_per_call() {
        let source = MapSource(HashMap::from([("workspace", "adb-123.cloud")]));

        let settings = resolve_connection_settings(&source).await;
        assert_eq!(settings.workspace_host.as_deref(), Some("adb-123.cloud"));
        // No warehouse override and (in this test process) no env default.
        // The env var may be set by the ambient environment, so only check
        // the persisted side here.
    }
}
