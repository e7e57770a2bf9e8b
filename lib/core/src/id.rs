//! Identifier types for domain entities.
//!
//! Identities are issued by the external identity provider. Their ids are
//! opaque to this system: they are compared and stored, never parsed.
//! Records this system creates itself are keyed by ULIDs, which sort by
//! creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique identifier for a user, as issued by the identity provider.
///
/// The same value keys the user's role profile (1:1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user ID from the provider-issued string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Unique identifier for a vendor application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(Ulid);

impl ApplicationId {
    /// Prefix used for display formatting.
    pub const PREFIX: &'static str = "app";

    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = ParseIdError;

    /// Accepts both the prefixed display form and a bare ULID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(s);

        Ulid::from_str(raw).map(Self).map_err(|e| ParseIdError {
            id_type: "ApplicationId",
            reason: e.to_string(),
        })
    }
}

impl From<Ulid> for ApplicationId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display_is_raw_value() {
        let id = UserId::new("0b7c6a0e-4a51-4c55-9d0f-3c1f8a3c2e11");
        assert_eq!(id.to_string(), "0b7c6a0e-4a51-4c55-9d0f-3c1f8a3c2e11");
        assert_eq!(id.as_str(), "0b7c6a0e-4a51-4c55-9d0f-3c1f8a3c2e11");
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::from("abc");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"abc\"");
        let parsed: UserId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);
    }

    #[test]
    fn application_id_display_has_prefix() {
        let id = ApplicationId::new();
        let display = id.to_string();
        assert!(display.starts_with("app_"));
        assert_eq!(display.len(), 4 + 26);
    }

    #[test]
    fn application_id_parses_with_and_without_prefix() {
        let id = ApplicationId::new();
        let prefixed: ApplicationId = id.to_string().parse().expect("prefixed");
        let bare: ApplicationId = id.as_ulid().to_string().parse().expect("bare");
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn application_id_rejects_garbage() {
        let err = "app_not-a-ulid".parse::<ApplicationId>().expect_err("invalid");
        assert_eq!(err.id_type, "ApplicationId");
    }

    #[test]
    fn application_ids_sort_by_creation() {
        let first = ApplicationId::from(Ulid::from_parts(1_000, 7));
        let second = ApplicationId::from(Ulid::from_parts(2_000, 3));
        assert!(first < second);
    }
}
