//! Error types for lakedash-server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lakedash_store::StoreError;
use lakedash_warehouse::WarehouseError;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Store(StoreError::InvalidEntry(reason)) => {
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            ServerError::Store(err) => {
                tracing::error!("store error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::Warehouse(WarehouseError::InvalidTable(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Warehouse(err) => {
                tracing::error!("warehouse error: {}", err);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            ServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response = ServerError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_entry_maps_to_400() {
        let response =
            ServerError::Store(StoreError::InvalidEntry("key too long".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_transport_errors_map_to_500() {
        let response = ServerError::Store(StoreError::Pool("pool closed".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn warehouse_failures_map_to_502() {
        let response = ServerError::Warehouse(WarehouseError::Statement {
            state: "FAILED".to_string(),
            message: "TABLE_OR_VIEW_NOT_FOUND".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_table_maps_to_400() {
        let response =
            ServerError::Warehouse(WarehouseError::InvalidTable("bad; table".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
