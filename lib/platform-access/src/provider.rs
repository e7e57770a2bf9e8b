//! The identity provider seam.
//!
//! User storage, password verification, the OAuth dance, and token
//! issuance all live at an external provider. This trait is the full extent
//! of what the marketplace asks of it.

use crate::error::ProviderError;
use crate::identity::Identity;
use crate::session::{EstablishedSession, ProviderSession, SessionTokens};
use async_trait::async_trait;
use rootcause::Report;

/// Account details submitted at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Canonical role name stored in provider metadata.
    pub role: String,
    pub phone: Option<String>,
}

/// What the provider hands back after a sign-up.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    /// The created account, if the provider reported one.
    pub user: Option<Identity>,
    /// Present when the provider confirmed the account immediately.
    pub session: Option<ProviderSession>,
}

/// OAuth authorization request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
    /// PKCE challenge derived from the verifier kept by the caller.
    pub code_challenge: String,
}

/// Operations delegated to the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Establishes a session from a credential pair.
    ///
    /// The provider may refresh the pair; the new tokens are then reported
    /// in [`EstablishedSession::rotated`].
    async fn set_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<EstablishedSession, Report<ProviderError>>;

    /// Resolves the identity behind an access token.
    async fn get_user(&self, access_token: &str) -> Result<Identity, Report<ProviderError>>;

    /// Completes the OAuth flow by exchanging an authorization code.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderSession, Report<ProviderError>>;

    /// Signs in with e-mail and password.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, Report<ProviderError>>;

    /// Creates an account.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<ProviderError>>;

    /// Revokes the session behind an access token, if any.
    async fn sign_out(&self, access_token: Option<&str>) -> Result<(), Report<ProviderError>>;

    /// Returns the URL to send the browser to for OAuth sign-in.
    fn authorize_url(&self, request: &AuthorizeRequest) -> Result<String, Report<ProviderError>>;
}
