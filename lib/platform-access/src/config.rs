//! Identity provider configuration.
//!
//! Fields with defaults can be omitted when loading from environment variables.

use serde::{Deserialize, Serialize};

/// Connection settings for the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider project (e.g. "https://abc.supabase.co").
    url: String,
    /// Public API key sent with every request.
    anon_key: String,
    /// Where the provider sends the browser back to after OAuth sign-in.
    oauth_redirect_url: String,
    /// OAuth provider to sign in with.
    /// Default: "google"
    #[serde(default = "default_oauth_provider")]
    oauth_provider: String,
}

fn default_oauth_provider() -> String {
    "google".to_string()
}

impl ProviderConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String, oauth_redirect_url: String) -> Self {
        Self {
            url,
            anon_key,
            oauth_redirect_url,
            oauth_provider: default_oauth_provider(),
        }
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    #[must_use]
    pub fn oauth_redirect_url(&self) -> &str {
        &self.oauth_redirect_url
    }

    #[must_use]
    pub fn oauth_provider(&self) -> &str {
        &self.oauth_provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_drops_trailing_slash() {
        let config = ProviderConfig::new(
            "https://abc.supabase.co/".to_string(),
            "key".to_string(),
            "http://localhost:4321/api/auth/callback".to_string(),
        );
        assert_eq!(config.url(), "https://abc.supabase.co");
        assert_eq!(config.oauth_provider(), "google");
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{
            "url": "https://abc.supabase.co",
            "anon_key": "key",
            "oauth_redirect_url": "http://localhost:4321/api/auth/callback"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.oauth_provider(), "google");
        assert_eq!(config.anon_key(), "key");
    }
}
