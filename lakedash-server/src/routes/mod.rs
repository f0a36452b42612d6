//! Route handlers for lakedash-server.
//!
//! Organized by resource:
//! - settings: effective connection settings (read + persist overrides)
//! - health: health check and database probe
//! - identity: forwarded-header identity
//! - trips: warehouse aggregations

pub mod health;
pub mod identity;
pub mod settings;
pub mod trips;

pub use health::*;
pub use identity::*;
pub use settings::*;
pub use trips::*;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/whoami", get(whoami))
        .route("/fares", get(fares))
        .route("/destinations", get(destinations))
}
