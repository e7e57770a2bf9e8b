//! Platform access for the carnaval marketplace.
//!
//! This crate provides:
//! - The role model (`Role`) with its linear hierarchy and landing pages
//! - Identity and role profile types (`Identity`, `RoleProfile`)
//! - Session hydration from credential cookies or a bearer token
//!   (`resolve_session`, `resolve_bearer`)
//! - Route classification and the per-request access decision
//!   (`RouteClassifier`, `AccessPolicy`)
//! - The seams to the external identity provider and to storage
//!   (`IdentityProvider`, `ProfileStore`, `ApplicationStore`)
//! - Vendor applications (`VendorApplication`, `ApplicationStats`)
//!
//! # Access Control Model
//!
//! Credentials, passwords, and OAuth are delegated to an external identity
//! provider. This crate keeps a role profile per identity and decides, per
//! request path, whether the caller may proceed:
//! - Unauthenticated callers on protected paths go to sign-in
//! - Authenticated callers lacking the role go to their own landing page
//! - An e-mail allow-list grants access to the administration area
//!
//! # Example
//!
//! ```
//! use carnaval_core::UserId;
//! use carnaval_platform_access::{
//!     AccessDecision, AccessPolicy, CurrentUser, Identity, NewProfile, Role, RoleProfile,
//! };
//!
//! let id = UserId::new("8f14e45f");
//! let profile = RoleProfile::from_new(
//!     NewProfile::new(id.clone(), "ana@example.com".to_string()).with_role(Role::Vendor),
//! );
//! let user = CurrentUser::new(Identity::new(id, Some("ana@example.com".to_string())), Some(profile));
//!
//! let policy = AccessPolicy::new(vec!["admin@carnaval-oruro.com".to_string()]);
//! assert_eq!(policy.decide("/vendor/products", Some(&user)), AccessDecision::Allow);
//! assert_eq!(policy.decide("/admin/users", Some(&user)), AccessDecision::Redirect("/vendor"));
//! assert_eq!(policy.decide("/dashboard", None), AccessDecision::SignInRequired);
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod provider;
pub mod role;
pub mod route;
pub mod session;
pub mod store;
pub mod vendor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types at crate root
pub use access::{AccessDecision, AccessPolicy, SIGN_IN_PATH, SIGN_UP_PATH};
pub use config::ProviderConfig;
pub use error::{ApplicationStoreError, ProfileStoreError, ProviderError};
pub use identity::Identity;
pub use profile::{NewProfile, ProfileUpdate, RoleProfile};
pub use provider::{AuthorizeRequest, IdentityProvider, SignUpOutcome, SignUpRequest};
pub use role::{Role, landing_page_for};
pub use route::{RouteClass, RouteClassifier};
pub use session::{
    CurrentUser, EstablishedSession, ProviderSession, ResolvedSession, SessionTokens,
    resolve_bearer, resolve_session,
};
pub use store::{ApplicationStore, ProfileStore};
pub use vendor::{
    ApplicationDetails, ApplicationForm, ApplicationStats, ApplicationStatus, BusinessType,
    BusinessTypeCount, InvalidApplication, VendorApplication,
};
