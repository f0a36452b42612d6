//! Health check route.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - service liveness plus a database connectivity probe.
/// A failing probe degrades the status rather than failing the endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store().version().await {
        Ok(version) => DatabaseHealth {
            connected: true,
            server_version: Some(version),
            error: None,
        },
        Err(err) => {
            warn!("database probe failed: {}", err);
            DatabaseHealth {
                connected: false,
                server_version: None,
                error: Some(err.to_string()),
            }
        }
    };

    let status = if database.connected { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        database,
    })
}
