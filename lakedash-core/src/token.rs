//! Short-lived credential acquisition.
//!
//! Every new database connection (and every warehouse API call) presents a
//! freshly obtained bearer token rather than a long-lived secret. The
//! [`TokenProvider`] trait is the capability handed to connection factories;
//! provider failures surface as connection errors at the call site.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Default environment variable consulted by [`EnvTokenProvider`].
pub const DEFAULT_TOKEN_VAR: &str = "DATABRICKS_TOKEN";

/// Supplies a bearer token for one connection or request.
///
/// Implementations must be cheap to call repeatedly; callers invoke
/// `obtain_token` once per new physical connection, never per query.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn obtain_token(&self) -> Result<String>;
}

/// Reads a personal access token from the environment on every call.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn obtain_token(&self) -> Result<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow!("{} is not set", self.var))
    }
}

/// OAuth client-credentials flow against the workspace token endpoint.
///
/// Each call performs the exchange and returns the resulting short-lived
/// access token; tokens are deliberately not cached across calls.
pub struct OauthTokenProvider {
    http: reqwest::Client,
    host: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OauthTokenProvider {
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();
        let host = host
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();
        if host.is_empty() {
            return Err(anyhow!("workspace host for OAuth token exchange is empty"));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            host,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }
}

#[async_trait]
impl TokenProvider for OauthTokenProvider {
    async fn obtain_token(&self) -> Result<String> {
        let url = format!("https://{}/oidc/v1/token", self.host);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "all-apis")])
            .send()
            .await
            .context("token endpoint unreachable")?
            .error_for_status()
            .context("token exchange rejected")?
            .json::<TokenResponse>()
            .await
            .context("malformed token response")?;

        Ok(response.access_token)
    }
}

/// Fixed token, for tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn obtain_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Pick a provider from the environment: OAuth client credentials when a
/// client id/secret pair is configured, a personal access token otherwise.
pub fn credentials_from_env() -> Result<Arc<dyn TokenProvider>> {
    let client_id = std::env::var("DATABRICKS_CLIENT_ID").ok();
    let client_secret = std::env::var("DATABRICKS_CLIENT_SECRET").ok();
    let host = std::env::var("DATABRICKS_SERVER_HOSTNAME").ok();

    match (client_id, client_secret, host) {
        (Some(id), Some(secret), Some(host))
            if !id.is_empty() && !secret.is_empty() && !host.is_empty() =>
        {
            debug!("using OAuth client-credentials token provider");
            Ok(Arc::new(OauthTokenProvider::new(host, id, secret)?))
        }
        _ => {
            debug!(var = DEFAULT_TOKEN_VAR, "using env token provider");
            Ok(Arc::new(EnvTokenProvider::default()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider("tok-123".to_string());
        assert_eq!(provider.obtain_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn env_provider_fails_when_var_is_unset() {
        let provider = EnvTokenProvider::new("LAKEDASH_TEST_TOKEN_THAT_IS_NEVER_SET");
        let err = provider.obtain_token().await.unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }

    #[test]
    fn oauth_provider_normalizes_host() {
        let provider =
            OauthTokenProvider::new("https://adb-123.cloud/", "id", "secret").unwrap();
        assert_eq!(provider.host, "adb-123.cloud");
    }

    #[test]
    fn oauth_provider_rejects_empty_host() {
        assert!(OauthTokenProvider::new("https://", "id", "secret").is_err());
    }
}
