//! User identity from hosting-platform forwarded headers.
//!
//! When the app runs behind the workspace proxy, the platform injects
//! `x-forwarded-*` headers identifying the signed-in user. During local
//! development the `LOCAL_DEV_USER` / `LOCAL_DEV_EMAIL` / `LOCAL_USER_TOKEN`
//! environment variables can stand in for them; overrides only fill gaps and
//! never shadow a header the platform actually sent.

use std::collections::HashMap;

use serde::Serialize;

const HEADER_PREFERRED_USERNAME: &str = "x-forwarded-preferred-username";
const HEADER_USER: &str = "x-forwarded-user";
const HEADER_EMAIL: &str = "x-forwarded-email";
const HEADER_ACCESS_TOKEN: &str = "x-forwarded-access-token";

/// Identity extracted from forwarded headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Normalize raw request headers into the lowercased map the identity
/// helpers expect, applying local-dev overrides for any header that is
/// missing.
pub fn forwarded_headers<I>(raw: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut headers: HashMap<String, String> = raw
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect();

    apply_local_overrides(&mut headers, &local_header_overrides());
    headers
}

/// Extract username and email from a lowercased header map.
pub fn resolve_user_identity(headers: &HashMap<String, String>) -> UserIdentity {
    let username = non_empty(headers.get(HEADER_PREFERRED_USERNAME))
        .or_else(|| non_empty(headers.get(HEADER_USER)));
    let email = non_empty(headers.get(HEADER_EMAIL));

    UserIdentity { username, email }
}

/// Header overrides sourced from `LOCAL_DEV_*` environment variables.
fn local_header_overrides() -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    for (var, header) in [
        ("LOCAL_DEV_USER", HEADER_USER),
        ("LOCAL_DEV_EMAIL", HEADER_EMAIL),
        ("LOCAL_USER_TOKEN", HEADER_ACCESS_TOKEN),
    ] {
        if let Some(value) = std::env::var(var).ok().filter(|v| !v.is_empty()) {
            overrides.insert(header.to_string(), value);
        }
    }
    overrides
}

fn apply_local_overrides(
    headers: &mut HashMap<String, String>,
    overrides: &HashMap<String, String>,
) {
    for (header, value) in overrides {
        headers
            .entry(header.clone())
            .or_insert_with(|| value.clone());
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
