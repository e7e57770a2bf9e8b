//! In-memory identity provider and profile store.
//!
//! Available to this crate's tests and, through the `testing` feature, to
//! dependent crates' tests.

use crate::error::{ApplicationStoreError, ProfileStoreError, ProviderError};
use crate::identity::Identity;
use crate::profile::{NewProfile, ProfileUpdate, RoleProfile};
use crate::provider::{AuthorizeRequest, IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::session::{EstablishedSession, ProviderSession, SessionTokens};
use crate::store::{ApplicationStore, ProfileStore};
use crate::vendor::{ApplicationStatus, VendorApplication};
use async_trait::async_trait;
use carnaval_core::{ApplicationId, UserId};
use rootcause::Report;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct ProviderState {
    /// access token -> identity
    sessions: HashMap<String, Identity>,
    /// refresh token -> rotated pair
    refreshes: HashMap<String, SessionTokens>,
    /// e-mail -> (password, identity, issued pair)
    accounts: HashMap<String, (String, Identity, Option<SessionTokens>)>,
    /// (code, verifier) -> issued pair
    codes: HashMap<(String, String), SessionTokens>,
    auto_confirm: bool,
    conceal_existing: bool,
    fail_sign_out: bool,
    set_session_calls: usize,
    sign_ups: Vec<SignUpRequest>,
    signed_out: Vec<Option<String>>,
}

/// Identity provider backed by in-memory tables.
#[derive(Default)]
pub struct FakeIdentityProvider {
    state: Mutex<ProviderState>,
}

impl FakeIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a valid access token for `identity`.
    pub async fn add_session(&self, access_token: &str, identity: Identity) {
        self.state
            .lock()
            .await
            .sessions
            .insert(access_token.to_string(), identity);
    }

    /// Registers a refresh token that rotates into `tokens`.
    pub async fn add_refresh(&self, refresh_token: &str, tokens: SessionTokens) {
        self.state
            .lock()
            .await
            .refreshes
            .insert(refresh_token.to_string(), tokens);
    }

    /// Registers a password account; signing in yields `tokens`.
    pub async fn add_account(&self, password: &str, identity: Identity, tokens: SessionTokens) {
        let mut state = self.state.lock().await;
        let email = identity.email.clone().unwrap_or_default();
        state
            .sessions
            .insert(tokens.access_token.clone(), identity.clone());
        state
            .accounts
            .insert(email, (password.to_string(), identity, Some(tokens)));
    }

    /// Registers an OAuth authorization code.
    pub async fn add_code(&self, code: &str, verifier: &str, identity: Identity, tokens: SessionTokens) {
        let mut state = self.state.lock().await;
        state.sessions.insert(tokens.access_token.clone(), identity);
        state
            .codes
            .insert((code.to_string(), verifier.to_string()), tokens);
    }

    /// Makes sign-up return a session immediately.
    pub async fn auto_confirm(&self, enabled: bool) {
        self.state.lock().await.auto_confirm = enabled;
    }

    /// Makes sign-up of a registered e-mail answer with a placeholder
    /// account instead of an error, as providers do when confirmations are on.
    pub async fn conceal_existing_accounts(&self, enabled: bool) {
        self.state.lock().await.conceal_existing = enabled;
    }

    /// Makes sign-out fail.
    pub async fn fail_sign_out(&self, enabled: bool) {
        self.state.lock().await.fail_sign_out = enabled;
    }

    pub async fn set_session_calls(&self) -> usize {
        self.state.lock().await.set_session_calls
    }

    pub async fn sign_ups(&self) -> Vec<SignUpRequest> {
        self.state.lock().await.sign_ups.clone()
    }

    pub async fn signed_out(&self) -> Vec<Option<String>> {
        self.state.lock().await.signed_out.clone()
    }

    fn session_for(state: &ProviderState, tokens: &SessionTokens) -> Option<ProviderSession> {
        state
            .sessions
            .get(&tokens.access_token)
            .map(|user| ProviderSession {
                tokens: tokens.clone(),
                expires_at: None,
                user: user.clone(),
            })
    }
}

fn unauthorized(reason: &str) -> Report<ProviderError> {
    ProviderError::Unauthorized {
        reason: reason.to_string(),
    }
    .into()
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn set_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<EstablishedSession, Report<ProviderError>> {
        let mut state = self.state.lock().await;
        state.set_session_calls += 1;

        if let Some(user) = state.sessions.get(&tokens.access_token) {
            return Ok(EstablishedSession {
                user: user.clone(),
                rotated: None,
            });
        }

        let rotated = state
            .refreshes
            .get(&tokens.refresh_token)
            .cloned()
            .ok_or_else(|| unauthorized("Invalid Refresh Token"))?;
        let user = state
            .sessions
            .get(&rotated.access_token)
            .cloned()
            .ok_or_else(|| unauthorized("User not found"))?;
        Ok(EstablishedSession {
            user,
            rotated: Some(rotated),
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity, Report<ProviderError>> {
        self.state
            .lock()
            .await
            .sessions
            .get(access_token)
            .cloned()
            .ok_or_else(|| unauthorized("invalid JWT"))
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        let state = self.state.lock().await;
        state
            .codes
            .get(&(code.to_string(), code_verifier.to_string()))
            .and_then(|tokens| Self::session_for(&state, tokens))
            .ok_or_else(|| {
                ProviderError::Rejected {
                    status: 400,
                    message: "invalid flow state, no valid flow state found".to_string(),
                }
                .into()
            })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, Report<ProviderError>> {
        let state = self.state.lock().await;
        let invalid = || -> Report<ProviderError> {
            ProviderError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }
            .into()
        };
        let (expected, _, tokens) = state.accounts.get(email).ok_or_else(invalid)?;
        if expected != password {
            return Err(invalid());
        }
        tokens
            .as_ref()
            .and_then(|tokens| Self::session_for(&state, tokens))
            .ok_or_else(invalid)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<ProviderError>> {
        let mut state = self.state.lock().await;
        state.sign_ups.push(request.clone());
        if state.accounts.contains_key(&request.email) {
            if state.conceal_existing {
                let placeholder = Identity::new(
                    format!("ghost-{}", state.sign_ups.len()),
                    Some(request.email.clone()),
                )
                .with_identities(Vec::new());
                return Ok(SignUpOutcome {
                    user: Some(placeholder),
                    session: None,
                });
            }
            return Err(ProviderError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            }
            .into());
        }

        let user = Identity::new(
            format!("u-{}", state.sign_ups.len()),
            Some(request.email.clone()),
        )
        .with_metadata("full_name", request.full_name.clone())
        .with_metadata("role", request.role.clone());
        state.accounts.insert(
            request.email.clone(),
            (request.password.clone(), user.clone(), None),
        );

        let session = state.auto_confirm.then(|| {
            let tokens = SessionTokens::new(
                format!("access-{}", user.id),
                format!("refresh-{}", user.id),
            );
            ProviderSession {
                tokens,
                expires_at: None,
                user: user.clone(),
            }
        });
        if let Some(session) = &session {
            state
                .sessions
                .insert(session.tokens.access_token.clone(), user.clone());
        }

        Ok(SignUpOutcome {
            user: Some(user),
            session,
        })
    }

    async fn sign_out(&self, access_token: Option<&str>) -> Result<(), Report<ProviderError>> {
        let mut state = self.state.lock().await;
        state.signed_out.push(access_token.map(str::to_string));
        if state.fail_sign_out {
            return Err(ProviderError::Transport {
                details: "connection refused".to_string(),
            }
            .into());
        }
        if let Some(token) = access_token {
            state.sessions.remove(token);
        }
        Ok(())
    }

    fn authorize_url(&self, request: &AuthorizeRequest) -> Result<String, Report<ProviderError>> {
        Ok(format!(
            "https://provider.test/auth/v1/authorize?provider=google&code_challenge={}",
            request.code_challenge
        ))
    }
}

#[derive(Default)]
struct StoreState {
    profiles: HashMap<UserId, RoleProfile>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Profile store backed by a map.
#[derive(Default)]
pub struct MemoryProfileStore {
    state: Mutex<StoreState>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every lookup fail with a backend error.
    pub async fn fail_reads(&self, enabled: bool) {
        self.state.lock().await.fail_reads = enabled;
    }

    /// Makes every write fail with a backend error.
    pub async fn fail_writes(&self, enabled: bool) {
        self.state.lock().await.fail_writes = enabled;
    }

    /// Returns a stored profile without going through the trait.
    pub async fn snapshot(&self, id: &UserId) -> Option<RoleProfile> {
        self.state.lock().await.profiles.get(id).cloned()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.state.lock().await.profiles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn backend(details: &str) -> Report<ProfileStoreError> {
    ProfileStoreError::Backend {
        details: details.to_string(),
    }
    .into()
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<RoleProfile>, Report<ProfileStoreError>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(backend("connection reset by peer"));
        }
        Ok(state.profiles.get(id).cloned())
    }

    async fn create(&self, new: NewProfile) -> Result<RoleProfile, Report<ProfileStoreError>> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(backend("permission denied for table user_profiles"));
        }
        if state.profiles.contains_key(&new.id) {
            return Err(ProfileStoreError::Conflict { user_id: new.id }.into());
        }
        let profile = RoleProfile::from_new(new);
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<RoleProfile, Report<ProfileStoreError>> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(backend("permission denied for table user_profiles"));
        }
        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| ProfileStoreError::NotFound {
                user_id: id.clone(),
            })?;
        profile.apply(update);
        Ok(profile.clone())
    }
}

#[derive(Default)]
struct ApplicationState {
    applications: Vec<VendorApplication>,
    fail_reads: bool,
}

/// Vendor application store backed by a list.
#[derive(Default)]
pub struct MemoryApplicationStore {
    state: Mutex<ApplicationState>,
}

impl MemoryApplicationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an application as is, skipping the open-application check.
    pub async fn seed(&self, application: VendorApplication) {
        self.state.lock().await.applications.push(application);
    }

    /// Makes every read fail with a backend error.
    pub async fn fail_reads(&self, enabled: bool) {
        self.state.lock().await.fail_reads = enabled;
    }

    /// Number of stored applications.
    pub async fn len(&self) -> usize {
        self.state.lock().await.applications.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn read_failure() -> Report<ApplicationStoreError> {
    ApplicationStoreError::Backend {
        details: "relation \"vendor_applications\" does not exist".to_string(),
    }
    .into()
}

fn newest_first(mut applications: Vec<VendorApplication>) -> Vec<VendorApplication> {
    applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    applications
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create(
        &self,
        application: VendorApplication,
    ) -> Result<VendorApplication, Report<ApplicationStoreError>> {
        let mut state = self.state.lock().await;
        let open = state
            .applications
            .iter()
            .any(|a| a.user_id == application.user_id && a.status.is_open());
        if open {
            return Err(ApplicationStoreError::AlreadyOpen {
                user_id: application.user_id,
            }
            .into());
        }
        state.applications.push(application.clone());
        Ok(application)
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VendorApplication>, Report<ApplicationStoreError>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(read_failure());
        }
        Ok(state
            .applications
            .iter()
            .filter(|a| &a.user_id == user_id)
            .max_by_key(|a| a.submitted_at)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<VendorApplication>, Report<ApplicationStoreError>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(read_failure());
        }
        Ok(state.applications.iter().find(|a| &a.id == id).cloned())
    }

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, Report<ApplicationStoreError>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(read_failure());
        }
        let matching = state
            .applications
            .iter()
            .filter(|a| status.is_none_or(|wanted| a.status == wanted))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }
}
