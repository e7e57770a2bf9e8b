//! Identity provider client over the GoTrue REST auth API.
//!
//! Every request carries the project's public `apikey`. Session-scoped calls
//! add the caller's access token as a bearer credential.

use async_trait::async_trait;
use carnaval_platform_access::{
    AuthorizeRequest, EstablishedSession, Identity, IdentityProvider, ProviderConfig,
    ProviderError, ProviderSession, SessionTokens, SignUpOutcome, SignUpRequest,
};
use reqwest::{RequestBuilder, StatusCode, Url};
use rootcause::Report;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

/// Client for the provider's auth endpoints.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self) -> ProviderSession {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|seconds| chrono::Utc::now().timestamp() + seconds)
        });
        ProviderSession {
            tokens: SessionTokens::new(self.access_token, self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a full session when the account is confirmed
/// immediately, and with the bare account otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(Identity),
}

/// Error body; different endpoints fill different fields.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Maps a non-success response to a [`ProviderError`].
fn error_from_response(status: StatusCode, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Unauthorized { reason: message }
        }
        _ => ProviderError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

impl GoTrueClient {
    /// Creates a client for the configured provider project.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is unusable or the HTTP client
    /// cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, Report<ProviderError>> {
        Url::parse(config.url()).map_err(|e| ProviderError::Configuration {
            details: format!("invalid provider URL: {e}"),
        })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::Configuration {
                details: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Report<ProviderError>> {
        let response = request
            .header("apikey", self.config.anon_key())
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                details: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderError::Transport {
            details: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(error_from_response(status, &body).into());
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse {
                details: e.to_string(),
            }
            .into()
        })
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        let request = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let response: TokenResponse = self.send(request).await?;
        Ok(response.into_session())
    }

    /// Exchanges a refresh token for a new pair.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip_all)]
    async fn set_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<EstablishedSession, Report<ProviderError>> {
        match self.get_user(&tokens.access_token).await {
            Ok(user) => Ok(EstablishedSession {
                user,
                rotated: None,
            }),
            Err(report) if report.current_context().is_unauthorized() => {
                debug!("access token rejected, refreshing session");
                let session = self.refresh_session(&tokens.refresh_token).await?;
                Ok(EstablishedSession {
                    user: session.user,
                    rotated: Some(session.tokens),
                })
            }
            Err(report) => Err(report),
        }
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<Identity, Report<ProviderError>> {
        let request = self
            .http
            .get(self.endpoint("user"))
            .bearer_auth(access_token);
        self.send(request).await
    }

    #[instrument(skip_all)]
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": code, "code_verifier": code_verifier }),
        )
        .await
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    #[instrument(skip_all, fields(email = %request.email, role = %request.role))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<ProviderError>> {
        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "full_name": request.full_name,
                "role": request.role,
                "phone": request.phone,
            },
        });
        let http_request = self.http.post(self.endpoint("signup")).json(&body);

        let outcome = match self.send::<SignUpResponse>(http_request).await? {
            SignUpResponse::Session(response) => {
                let session = response.into_session();
                SignUpOutcome {
                    user: Some(session.user.clone()),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUpOutcome {
                user: Some(user),
                session: None,
            },
        };
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: Option<&str>) -> Result<(), Report<ProviderError>> {
        let Some(access_token) = access_token else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", self.config.anon_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                details: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body).into())
    }

    fn authorize_url(&self, request: &AuthorizeRequest) -> Result<String, Report<ProviderError>> {
        let url = Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", self.config.oauth_provider()),
                ("redirect_to", self.config.oauth_redirect_url()),
                ("code_challenge", request.code_challenge.as_str()),
                ("code_challenge_method", "s256"),
            ],
        )
        .map_err(|e| ProviderError::Configuration {
            details: format!("invalid authorize URL: {e}"),
        })?;
        Ok(url.to_string())
    }
}
