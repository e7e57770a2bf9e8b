//! Authorization gate middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use carnaval_platform_access::{
    AccessDecision, CurrentUser, SIGN_IN_PATH, resolve_bearer, resolve_session,
};
use std::sync::Arc;

use super::{
    AppState,
    cookies::{found, session_tokens, set_session_cookies, sets_session_cookie},
};

/// Returns the token of an `Authorization: Bearer` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

/// Resolves the caller's session and enforces route access for every request.
///
/// The session cookies are tried first, then a bearer token. The resolved
/// [`CurrentUser`] is attached to the request extensions when the request
/// goes through. Tokens the provider rotated while resolving the session are
/// written back on the outgoing response.
pub async fn authorization_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let (access_token, refresh_token) = session_tokens(&jar);
    let resolved = resolve_session(
        state.provider.as_ref(),
        state.profiles.as_ref(),
        access_token,
        refresh_token,
    )
    .await;
    let (user, rotated) = match resolved {
        Some(resolved) => (Some(resolved.user), resolved.rotated),
        None => (
            resolve_bearer(
                state.provider.as_ref(),
                state.profiles.as_ref(),
                bearer_token(request.headers()),
            )
            .await,
            None,
        ),
    };

    let path = request.uri().path().to_string();
    let response = match state.policy.decide(&path, user.as_ref()) {
        AccessDecision::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        AccessDecision::SignInRequired => {
            tracing::debug!(path = %path, "No session for protected path");
            found(SIGN_IN_PATH)
        }
        AccessDecision::Redirect(target) => {
            tracing::debug!(
                path = %path,
                user_id = ?user.as_ref().map(|u| u.identity.id.to_string()),
                redirect_to = target,
                "Redirecting by role"
            );
            found(target)
        }
    };

    match rotated {
        // A handler that wrote the session cookies itself has the last word.
        Some(tokens) if !sets_session_cookie(&response) => {
            tracing::debug!("Re-issuing rotated session cookies");
            let jar = set_session_cookies(CookieJar::new(), &tokens, &state.session_config);
            (jar, response).into_response()
        }
        _ => response,
    }
}

/// Extractor for requiring an authenticated user.
///
/// Rejects with `401 Unauthorized` when the gate attached no user.
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(RequireUser)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns None if the user is not authenticated.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }
}
