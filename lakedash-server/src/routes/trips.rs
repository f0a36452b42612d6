//! Warehouse aggregation routes.

use axum::extract::{Query, State};
use axum::Json;
use lakedash_core::resolve_connection_settings;
use lakedash_warehouse::{
    fares_by_zip, top_destinations, DestinationSummary, FareSummary, WarehouseClient,
    WarehouseConfig, DEFAULT_DESTINATION_LIMIT, DEFAULT_TRIPS_TABLE,
};
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TripsQuery {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/fares - average fare and trip count per pickup ZIP.
pub async fn fares(
    State(state): State<AppState>,
    Query(query): Query<TripsQuery>,
) -> ServerResult<Json<Vec<FareSummary>>> {
    let client = warehouse_client(&state).await?;
    let table = query
        .table
        .unwrap_or_else(|| DEFAULT_TRIPS_TABLE.to_string());

    let rows = fares_by_zip(&client, &table).await?;
    Ok(Json(rows))
}

/// GET /api/destinations - busiest pickup/dropoff pairs.
pub async fn destinations(
    State(state): State<AppState>,
    Query(query): Query<TripsQuery>,
) -> ServerResult<Json<Vec<DestinationSummary>>> {
    let client = warehouse_client(&state).await?;
    let table = query
        .table
        .unwrap_or_else(|| DEFAULT_TRIPS_TABLE.to_string());
    let limit = query.limit.unwrap_or(DEFAULT_DESTINATION_LIMIT);

    let rows = top_destinations(&client, &table, limit).await?;
    Ok(Json(rows))
}

/// Build a warehouse client from freshly resolved settings, so a settings
/// update takes effect without a restart.
async fn warehouse_client(state: &AppState) -> Result<WarehouseClient, ServerError> {
    let settings = resolve_connection_settings(state.store()).await;

    let host = settings.workspace_host.ok_or_else(|| {
        ServerError::BadRequest(
            "workspace host is not configured; set it via PUT /api/settings \
             or DATABRICKS_SERVER_HOSTNAME"
                .to_string(),
        )
    })?;
    let http_path = settings.warehouse_path.ok_or_else(|| {
        ServerError::BadRequest(
            "warehouse path is not configured; set it via PUT /api/settings \
             or DATABRICKS_HTTP_PATH"
                .to_string(),
        )
    })?;

    WarehouseClient::new(WarehouseConfig { host, http_path }, state.credentials())
        .map_err(Into::into)
}
