//! Authentication and route authorization for the carnaval server.
//!
//! This module provides:
//! - The identity provider client (`GoTrueClient`)
//! - The Postgres role profile repository (`PgProfileRepository`)
//! - The authorization gate middleware and its extractors
//! - The auth endpoints under `/api/auth`
//!
//! # Session Model
//!
//! The provider issues an access/refresh token pair which the browser keeps
//! in two httpOnly cookies. API clients may send the access token as an
//! `Authorization: Bearer` header instead. Nothing is stored server-side: every request
//! hands the pair back to the provider, then loads the caller's role profile.
//! Role checks therefore see role changes on the very next request.

pub mod cookies;
pub mod db;
pub mod gotrue;
pub mod middleware;
pub mod routes;

use crate::config::SessionConfig;
use carnaval_platform_access::{AccessPolicy, ApplicationStore, IdentityProvider, ProfileStore};
use std::sync::Arc;

pub use db::PgProfileRepository;
pub use gotrue::GoTrueClient;
pub use middleware::{OptionalUser, RequireUser, authorization_gate};
pub use routes::{
    callback, create_profile, login, save_session, signin, signout, signup, update_profile,
};

/// Shared application state.
pub struct AppState {
    /// External identity provider.
    pub provider: Arc<dyn IdentityProvider>,
    /// Role profile storage.
    pub profiles: Arc<dyn ProfileStore>,
    /// Vendor application storage.
    pub applications: Arc<dyn ApplicationStore>,
    /// Route access rules.
    pub policy: AccessPolicy,
    /// Session cookie configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        applications: Arc<dyn ApplicationStore>,
        policy: AccessPolicy,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            provider,
            profiles,
            applications,
            policy,
            session_config,
        }
    }
}
