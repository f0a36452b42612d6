//! Connection-settings routes.

use axum::{extract::State, Json};
use lakedash_core::{resolve_detailed, ResolvedSetting, SettingName};
use lakedash_store::ConfigStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub workspace: ResolvedSetting,
    pub warehouse: ResolvedSetting,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
}

/// GET /api/settings - effective settings with provenance, derived fresh.
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(current_settings(state.store()).await)
}

/// PUT /api/settings - persist overrides for any of the provided fields.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> ServerResult<Json<SettingsResponse>> {
    if request.workspace.is_none() && request.warehouse.is_none() {
        return Err(ServerError::BadRequest(
            "provide at least one of \"workspace\" or \"warehouse\"".to_string(),
        ));
    }

    for (name, value) in [
        (SettingName::Workspace, &request.workspace),
        (SettingName::Warehouse, &request.warehouse),
    ] {
        if let Some(value) = value {
            let value = value.trim();
            if value.is_empty() {
                return Err(ServerError::BadRequest(format!(
                    "{} must not be empty",
                    name.key()
                )));
            }
            state.store().set(name.key(), value).await?;
            info!(setting = name.key(), "persisted settings override");
        }
    }

    Ok(Json(current_settings(state.store()).await))
}

async fn current_settings(store: &ConfigStore) -> SettingsResponse {
    SettingsResponse {
        workspace: resolve_detailed(store, SettingName::Workspace).await,
        warehouse: resolve_detailed(store, SettingName::Warehouse).await,
    }
}
