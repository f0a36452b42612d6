//! Forwarded-header identity route.

use axum::http::HeaderMap;
use axum::Json;
use lakedash_core::{forwarded_headers, resolve_user_identity, UserIdentity};

/// GET /api/whoami - the signed-in user, as reported by the hosting proxy's
/// forwarded headers (with local-dev overrides filling any gaps).
pub async fn whoami(headers: HeaderMap) -> Json<UserIdentity> {
    let headers = forwarded_headers(headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|value| (name.as_str().to_string(), value.to_string()))
    }));

    Json(resolve_user_identity(&headers))
}
