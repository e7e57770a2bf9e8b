//! Authentication endpoints under `/api/auth`.

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use carnaval_core::UserId;
use carnaval_platform_access::{
    AuthorizeRequest, NewProfile, ProfileStoreError, ProfileUpdate, Role, SIGN_IN_PATH,
    SIGN_UP_PATH, SessionTokens, SignUpRequest,
};
use oauth2::PkceCodeChallenge;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{
    AppState,
    cookies::{
        ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE, clear_code_verifier, clear_session_cookies,
        found, found_with_message, set_code_verifier, set_session_cookies,
    },
    middleware::RequireUser,
};

/// Where a successful sign-in lands.
const DASHBOARD_PATH: &str = "/dashboard";

/// Returns the value if it holds more than whitespace.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

/// Initiates the OAuth login flow by redirecting to the identity provider.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let request = AuthorizeRequest {
        code_challenge: challenge.as_str().to_string(),
    };

    match state.provider.authorize_url(&request) {
        Ok(url) => {
            let jar = set_code_verifier(
                jar,
                verifier.secret().clone(),
                state.session_config.secure_cookies,
            );
            (jar, found(&url)).into_response()
        }
        Err(report) => AuthError::LoginUnavailable(report.to_string()).into_response(),
    }
}

/// Handles the OAuth callback after the user authenticates with the provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let verifier = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = clear_code_verifier(jar);

    let (Some(code), Some(verifier)) = (present(query.code), verifier) else {
        tracing::warn!("OAuth callback without code or verifier");
        return (jar, auth_failed()).into_response();
    };

    match state
        .provider
        .exchange_code_for_session(&code, &verifier)
        .await
    {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "OAuth sign-in completed");
            let jar = set_session_cookies(jar, &session.tokens, &state.session_config);
            (jar, found(DASHBOARD_PATH)).into_response()
        }
        Err(report) => {
            tracing::warn!(error = %report, "Code exchange failed");
            (jar, auth_failed()).into_response()
        }
    }
}

fn auth_failed() -> Response {
    found_with_message(SIGN_IN_PATH, "error", "Unable to authenticate")
}

/// Password sign-in form.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    email: Option<String>,
    password: Option<String>,
}

/// Signs in with e-mail and password.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<SignInForm>, FormRejection>,
) -> Result<Response, AuthError> {
    let form = form.map(|Form(form)| form).ok();
    let (Some(email), Some(password)) = (
        present(form.as_ref().and_then(|f| f.email.clone())),
        present(form.and_then(|f| f.password)),
    ) else {
        return Err(AuthError::MissingCredentials);
    };

    match state.provider.sign_in_with_password(&email, &password).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "Password sign-in succeeded");
            let jar = set_session_cookies(jar, &session.tokens, &state.session_config);
            Ok((jar, found(DASHBOARD_PATH)).into_response())
        }
        Err(report) => {
            tracing::info!(error = %report, "Password sign-in rejected");
            Ok(found_with_message(
                SIGN_IN_PATH,
                "error",
                report.current_context().message(),
            ))
        }
    }
}

/// Account registration form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    phone: Option<String>,
}

fn signup_error(message: &str) -> Response {
    found_with_message(SIGN_UP_PATH, "error", message)
}

/// Registers an account with the provider and creates its role profile.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SignUpForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return signup_error("Email y contraseña son requeridos");
    };
    let (Some(email), Some(password)) = (present(form.email), present(form.password)) else {
        return signup_error("Email y contraseña son requeridos");
    };
    let Some(full_name) = present(form.full_name) else {
        return signup_error("El nombre completo es requerido");
    };
    let Some(role) = form
        .role
        .as_deref()
        .and_then(Role::parse)
        .filter(Role::is_self_assignable)
    else {
        return signup_error("Debe seleccionar un tipo de cuenta válido");
    };
    let phone = present(form.phone);

    let request = SignUpRequest {
        email: email.clone(),
        password,
        full_name: full_name.clone(),
        role: role.as_str().to_string(),
        phone: phone.clone(),
    };
    let outcome = match state.provider.sign_up(&request).await {
        Ok(outcome) => outcome,
        Err(report) => {
            tracing::info!(error = %report, "Sign-up rejected");
            return signup_error(report.current_context().message());
        }
    };

    let Some(user) = outcome.user else {
        return signup_error("No se pudo crear el usuario");
    };

    // An already registered e-mail comes back as an account with no linked
    // identities. Its id matches no real account, so it gets no profile.
    if user.is_placeholder() {
        tracing::debug!(user_id = %user.id, "Sign-up for an existing account");
    } else {
        tracing::info!(user_id = %user.id, role = %role, "Account registered");
        let new = NewProfile::new(user.id.clone(), user.email.clone().unwrap_or(email))
            .with_full_name(Some(full_name))
            .with_role(role)
            .with_phone(phone);
        match state.profiles.create(new).await {
            Ok(_) => {}
            Err(report)
                if matches!(report.current_context(), ProfileStoreError::Conflict { .. }) =>
            {
                tracing::debug!(user_id = %user.id, "Role profile already present");
            }
            Err(report) => {
                tracing::warn!(user_id = %user.id, error = %report, "Failed to create role profile");
            }
        }
    }

    // The sign-in form issues the cookies, even when a session came back.
    if outcome.session.is_some() {
        found_with_message(
            SIGN_IN_PATH,
            "success",
            "Cuenta creada exitosamente. Por favor inicia sesión.",
        )
    } else {
        found_with_message(
            SIGN_IN_PATH,
            "message",
            "Cuenta creada. Revisa tu email para confirmar tu cuenta antes de iniciar sesión.",
        )
    }
}

/// Signs out: revokes the session at the provider and clears both cookies.
pub async fn signout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let access_token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Err(report) = state.provider.sign_out(access_token.as_deref()).await {
        tracing::warn!(error = %report, "Provider sign-out failed");
    }

    (
        clear_session_cookies(jar),
        found_with_message(SIGN_IN_PATH, "message", "Sesión cerrada correctamente"),
    )
        .into_response()
}

/// Role profile creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    user_id: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
}

/// Creates the role profile for an account.
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(body) = body?;
    let (Some(user_id), Some(email)) = (present(body.user_id), present(body.email)) else {
        return Err(AuthError::MissingProfileFields);
    };
    let role = match body.role.as_deref() {
        None => Role::Customer,
        Some(name) => Role::parse(name)
            .filter(Role::is_self_assignable)
            .ok_or(AuthError::InvalidRole)?,
    };

    let new = NewProfile::new(UserId::new(user_id), email)
        .with_full_name(present(body.full_name))
        .with_role(role);
    let profile = state
        .profiles
        .create(new)
        .await
        .map_err(|report| match report.current_context() {
            ProfileStoreError::Conflict { .. } => AuthError::ProfileExists,
            other => AuthError::ProfileStore(format!("Error creando perfil: {}", other.message())),
        })?;

    Ok(Json(json!({ "success": true, "profile": profile })).into_response())
}

/// Updates the caller's own role profile.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(update) = body?;
    if update.is_empty()
        && let Some(profile) = user.profile
    {
        return Ok(Json(profile).into_response());
    }

    let profile = state
        .profiles
        .update(&user.identity.id, &update)
        .await
        .map_err(|report| {
            tracing::warn!(user_id = %user.identity.id, error = %report, "Profile update failed");
            AuthError::ProfileStore(report.current_context().message())
        })?;

    Ok(Json(profile).into_response())
}

/// Tokens obtained client-side, to be stored as session cookies.
#[derive(Debug, Deserialize)]
pub struct SaveSessionRequest {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

/// Validates a client-side token pair and stores it as session cookies.
pub async fn save_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<SaveSessionRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(body) = body?;
    let tokens = SessionTokens::from_cookies(
        body.access_token.as_deref(),
        body.refresh_token.as_deref(),
    )
    .ok_or(AuthError::MissingTokens)?;

    let established = state
        .provider
        .set_session(&tokens)
        .await
        .map_err(|report| AuthError::InvalidTokens(report.current_context().message().to_string()))?;

    let user = established.user;
    tracing::info!(user_id = %user.id, expires_at = ?body.expires_at, "Saving client session");

    let tokens = established.rotated.unwrap_or(tokens);
    let jar = set_session_cookies(jar, &tokens, &state.session_config);
    let summary = json!({
        "success": true,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.display_name(),
        },
    });
    Ok((jar, Json(summary)).into_response())
}

/// Authentication endpoint errors.
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    MissingProfileFields,
    InvalidRole,
    MissingTokens,
    InvalidTokens(String),
    MalformedBody(String),
    ProfileExists,
    ProfileStore(String),
    LoginUnavailable(String),
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "Email and password are required".to_string(),
            ),
            Self::MissingProfileFields => (
                StatusCode::BAD_REQUEST,
                "Usuario ID y email son requeridos".to_string(),
            ),
            Self::InvalidRole => (StatusCode::BAD_REQUEST, "Rol inválido".to_string()),
            Self::MissingTokens => (StatusCode::BAD_REQUEST, "Tokens requeridos".to_string()),
            Self::InvalidTokens(msg) => {
                (StatusCode::BAD_REQUEST, format!("Tokens inválidos: {msg}"))
            }
            Self::MalformedBody(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ProfileExists => (StatusCode::CONFLICT, "El perfil ya existe".to_string()),
            Self::ProfileStore(msg) => {
                tracing::error!("Profile store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            Self::LoginUnavailable(msg) => {
                tracing::error!("OAuth login unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error starting OAuth login".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
