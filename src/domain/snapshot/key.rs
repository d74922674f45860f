//! Snapshot key

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum length for snapshot keys
pub const MAX_KEY_LENGTH: usize = 50;

/// Alphanumeric segments joined by hyphens or underscores
static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated name under which a predictor snapshot is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotKey(String);

impl SnapshotKey {
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        validate_snapshot_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SnapshotKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SnapshotKey> for String {
    fn from(key: SnapshotKey) -> Self {
        key.0
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SnapshotKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn validate_snapshot_key(key: &str) -> Result<(), DomainError> {
    if key.is_empty() {
        return Err(DomainError::invalid_id("Snapshot key cannot be empty"));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(DomainError::invalid_id(format!(
            "Snapshot key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        )));
    }

    if !KEY_PATTERN.is_match(key) {
        return Err(DomainError::invalid_id(format!(
            "Snapshot key '{}' must be alphanumeric with hyphens or underscores",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(SnapshotKey::new("default").is_ok());
        assert!(SnapshotKey::new("user-42").is_ok());
        assert!(SnapshotKey::new("team_a").is_ok());
        assert!(SnapshotKey::new("a").is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(SnapshotKey::new("").is_err());
        assert!(SnapshotKey::new("-leading").is_err());
        assert!(SnapshotKey::new("trailing_").is_err());
        assert!(SnapshotKey::new("../escape").is_err());
        assert!(SnapshotKey::new("has space").is_err());
        assert!(SnapshotKey::new("a".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<SnapshotKey, _> = serde_json::from_str("\"default\"");
        assert!(ok.is_ok());

        let bad: Result<SnapshotKey, _> = serde_json::from_str("\"../etc\"");
        assert!(bad.is_err());
    }
}
