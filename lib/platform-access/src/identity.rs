//! Identity as reported by the external identity provider.
//!
//! The provider owns the account record. This system only references it,
//! keeping the fields it actually consumes.

use carnaval_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated account at the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued account id; also keys the role profile.
    pub id: UserId,
    /// Account e-mail, if the provider has one.
    #[serde(default)]
    pub email: Option<String>,
    /// Provider-side user metadata (`full_name`, `role`, `phone` at sign-up).
    #[serde(default, rename = "user_metadata")]
    pub metadata: Map<String, Value>,
    /// Sign-in methods linked to the account, when the provider reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<Value>>,
}

impl Identity {
    /// Creates an identity with no metadata.
    #[must_use]
    pub fn new(id: impl Into<UserId>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
            metadata: Map::new(),
            identities: None,
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Sets the linked sign-in methods.
    #[must_use]
    pub fn with_identities(mut self, identities: Vec<Value>) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Returns true if the provider reported an account with no sign-in
    /// method linked.
    ///
    /// With e-mail confirmation enabled, signing up an address that is
    /// already registered answers with such a placeholder under a fresh id
    /// instead of an error. It does not correspond to a real account.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.identities.as_ref().is_some_and(Vec::is_empty)
    }

    /// Returns the name to greet the user with: the metadata full name,
    /// falling back to the e-mail.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.metadata
            .get("full_name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name() {
        let identity = Identity::new("u1", Some("ana@example.com".to_string()))
            .with_metadata("full_name", "Ana Quispe");
        assert_eq!(identity.display_name(), Some("Ana Quispe"));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let identity = Identity::new("u1", Some("ana@example.com".to_string()))
            .with_metadata("full_name", "  ");
        assert_eq!(identity.display_name(), Some("ana@example.com"));

        let bare = Identity::new("u2", None);
        assert_eq!(bare.display_name(), None);
    }

    #[test]
    fn account_without_linked_identities_is_placeholder() {
        let payload = r#"{"id": "f00d", "email": "ana@example.com", "identities": []}"#;
        let identity: Identity = serde_json::from_str(payload).expect("deserialize");
        assert!(identity.is_placeholder());

        let linked = Identity::new("u1", None)
            .with_identities(vec![serde_json::json!({"provider": "email"})]);
        assert!(!linked.is_placeholder());

        // Unreported identities say nothing either way.
        assert!(!Identity::new("u2", None).is_placeholder());
    }

    #[test]
    fn deserializes_provider_user_payload() {
        let payload = r#"{
            "id": "8f14e45f",
            "aud": "authenticated",
            "email": "ana@example.com",
            "user_metadata": {"full_name": "Ana", "role": "vendedor"}
        }"#;
        let identity: Identity = serde_json::from_str(payload).expect("deserialize");
        assert_eq!(identity.id.as_str(), "8f14e45f");
        assert_eq!(identity.email.as_deref(), Some("ana@example.com"));
        assert_eq!(identity.display_name(), Some("Ana"));
    }
}
