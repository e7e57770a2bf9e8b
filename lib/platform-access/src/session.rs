//! Session credentials and request-time session hydration.
//!
//! A browser session is an access/refresh token pair issued by the identity
//! provider and carried in two cookies. On every request the pair is handed
//! back to the provider to resolve the caller's identity, then the role
//! profile is attached.

use crate::identity::Identity;
use crate::profile::RoleProfile;
use crate::provider::IdentityProvider;
use crate::role::Role;
use crate::store::ProfileStore;
use serde::{Deserialize, Serialize};

/// Access/refresh token pair. Both are opaque to this system.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionTokens {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Builds a pair from cookie values.
    ///
    /// Returns `None` unless both tokens are present and non-empty; half a
    /// pair is no session.
    #[must_use]
    pub fn from_cookies(access_token: Option<&str>, refresh_token: Option<&str>) -> Option<Self> {
        match (access_token, refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(Self::new(access, refresh))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// A session issued by the provider after sign-in, sign-up, or code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSession {
    pub tokens: SessionTokens,
    /// Unix timestamp at which the access token expires, if reported.
    pub expires_at: Option<i64>,
    pub user: Identity,
}

/// Result of establishing an existing token pair with the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EstablishedSession {
    pub user: Identity,
    /// New tokens, when the provider had to refresh the pair.
    pub rotated: Option<SessionTokens>,
}

/// The authenticated caller, attached to request-scoped context.
///
/// An identity may exist without a role profile; callers must handle that.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub identity: Identity,
    pub profile: Option<RoleProfile>,
}

impl CurrentUser {
    #[must_use]
    pub fn new(identity: Identity, profile: Option<RoleProfile>) -> Self {
        Self { identity, profile }
    }

    /// Returns the stored role, if a profile exists.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    /// Returns the role used for enforcement; a missing profile counts as
    /// the lowest role.
    #[must_use]
    pub fn effective_role(&self) -> Role {
        self.role().unwrap_or(Role::Customer)
    }

    /// Returns the addresses this user can be recognized by: the profile
    /// e-mail and the identity e-mail.
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.profile
            .as_ref()
            .map(|p| p.email.as_str())
            .into_iter()
            .chain(self.identity.email.as_deref())
    }
}

/// A hydrated session, plus any tokens the provider rotated on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSession {
    pub user: CurrentUser,
    pub rotated: Option<SessionTokens>,
}

/// Resolves the caller behind a pair of credential cookies.
///
/// Never fails: a missing token, a provider error, or an unknown identity
/// all mean "unauthenticated". A resolved identity without a stored
/// profile is still authenticated.
pub async fn resolve_session(
    provider: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Option<ResolvedSession> {
    let tokens = SessionTokens::from_cookies(access_token, refresh_token)?;

    let established = match provider.set_session(&tokens).await {
        Ok(established) => established,
        Err(report) => {
            tracing::debug!(error = %report, "Session credentials rejected");
            return None;
        }
    };

    let profile = profiles.get(&established.user.id).await;
    if profile.is_none() {
        tracing::debug!(user_id = %established.user.id, "Authenticated user has no role profile");
    }

    Some(ResolvedSession {
        user: CurrentUser::new(established.user, profile),
        rotated: established.rotated,
    })
}

/// Resolves the caller behind a bearer access token.
///
/// API clients that hold a token but no cookies authenticate this way. The
/// token is checked as is: there is no refresh token to fall back on, so an
/// expired token means "unauthenticated". Never fails, like
/// [`resolve_session`].
pub async fn resolve_bearer(
    provider: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    access_token: Option<&str>,
) -> Option<CurrentUser> {
    let access_token = access_token.filter(|token| !token.is_empty())?;

    let identity = match provider.get_user(access_token).await {
        Ok(identity) => identity,
        Err(report) => {
            tracing::debug!(error = %report, "Bearer token rejected");
            return None;
        }
    };

    let profile = profiles.get(&identity.id).await;
    Some(CurrentUser::new(identity, profile))
}
