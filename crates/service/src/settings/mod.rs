//! Settings store contract and its adapters
//!
//! The remote administration service keeps settings as a flat key/value
//! collection per scope. Keys are `/`-separated paths; listing a key returns
//! every entry below it, keyed by the remainder of the path.

use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;
pub mod json_file;

pub use http::HttpSettingsStore;
pub use json_file::JsonFileSettingsStore;

/// Settings entries keyed by (relative or full) setting key.
pub type Entries = BTreeMap<String, Value>;

/// Scope a setting lives in: organization-wide (`host`) or the calling user (`me`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserScope {
    Host,
    Me,
}

impl UserScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserScope::Host => "host",
            UserScope::Me => "me",
        }
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings service request failed: {0}")]
    Transport(String),
    #[error("settings service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected settings payload: {0}")]
    Decode(String),
    #[error("settings file error: {0}")]
    Io(String),
    #[error("invalid setting key: {0:?}")]
    InvalidKey(String),
}

/// Key/value settings collaborator used by the banner manager.
/// Implementations can be remote (HTTP) or file-backed.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// All entries below `key`, keyed by the path suffix after `key/`.
    async fn list(&self, scope: UserScope, key: &str) -> Result<Entries, SettingsError>;
    /// Write every entry (full keys) in one call, replacing existing values.
    async fn add_or_update(&self, scope: UserScope, entries: Entries) -> Result<(), SettingsError>;
    /// Delete the entry at `key` (full key).
    async fn remove(&self, scope: UserScope, key: &str) -> Result<(), SettingsError>;
}

pub(crate) fn check_key(key: &str) -> Result<(), SettingsError> {
    if key.trim().is_empty() || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(SettingsError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_renders_lowercase() {
        assert_eq!(UserScope::Host.to_string(), "host");
        assert_eq!(UserScope::Me.as_str(), "me");
    }

    #[test]
    fn key_check_rejects_empty_segments() {
        assert!(check_key("GlobalMessageBanners/m1").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("/a").is_err());
        assert!(check_key("a/").is_err());
        assert!(check_key("a//b").is_err());
    }

    #[test]
    fn key_check_rejects_dot_segments() {
        assert!(check_key("GlobalMessageBanners/..").is_err());
        assert!(check_key("GlobalMessageBanners/.").is_err());
        assert!(check_key("../GlobalMessageBanners").is_err());
        assert!(check_key("GlobalMessageBanners/..m1").is_ok());
    }
}
