//! lakedash-core: shared plumbing for the lakedash workspace
//!
//! This crate provides:
//! - Connection-settings resolution (persisted overrides > environment defaults)
//! - Forwarded-header identity resolution for hosted deployments
//! - Token provider abstraction for short-lived database/API credentials
//! - `.env` loading for local development

pub mod env;
pub mod identity;
pub mod settings;
pub mod token;

pub use identity::{forwarded_headers, resolve_user_identity, UserIdentity};
pub use settings::{
    resolve, resolve_connection_settings, resolve_detailed, EffectiveConnectionSettings,
    ResolvedSetting, SettingName, SettingProvenance, SettingsSource,
};
pub use token::{
    credentials_from_env, EnvTokenProvider, OauthTokenProvider, StaticTokenProvider, TokenProvider,
};
