//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`ProviderConfig`](carnaval_platform_access::ProviderConfig) for the
//! identity provider settings.

use carnaval_platform_access::ProviderConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL (holds the `user_profiles` table).
    pub database_url: String,

    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Identity provider configuration.
    pub provider: ProviderConfig,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Route access configuration.
    #[serde(default)]
    pub access: AccessConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:4321".to_string()
}

/// Session-cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Max-age of the access-token cookie, in days.
    #[serde(default = "default_access_token_max_age_days")]
    pub access_token_max_age_days: i64,

    /// Max-age of the refresh-token cookie, in days.
    #[serde(default = "default_refresh_token_max_age_days")]
    pub refresh_token_max_age_days: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_access_token_max_age_days() -> i64 {
    7
}

fn default_refresh_token_max_age_days() -> i64 {
    30
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_max_age_days: default_access_token_max_age_days(),
            refresh_token_max_age_days: default_refresh_token_max_age_days(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

/// Route access configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Comma-separated e-mails granted access to the administration area
    /// regardless of their stored role.
    #[serde(default = "default_admin_emails")]
    pub admin_emails: String,
}

fn default_admin_emails() -> String {
    "admin@carnaval-oruro.com,soporte.carnaval.oruro@gmail.com".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_emails: default_admin_emails(),
        }
    }
}

impl AccessConfig {
    /// Returns the allow-listed e-mails, trimmed and lower-cased.
    #[must_use]
    pub fn admin_emails(&self) -> Vec<String> {
        self.admin_emails
            .split(',')
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Nested fields use `__` as separator, e.g. `PROVIDER__ANON_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
