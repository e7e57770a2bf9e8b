//! Error types for the platform-access crate.
//!
//! Errors are wrapped in a rootcause `Report` at each async boundary:
//! - `ProviderError`: failures talking to the external identity provider
//! - `ProfileStoreError`: failures reading or writing role profiles
//! - `ApplicationStoreError`: failures reading or writing vendor applications

use carnaval_core::UserId;
use std::fmt;

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected the presented credentials or token.
    Unauthorized { reason: String },
    /// The provider answered with an error for the request.
    Rejected { status: u16, message: String },
    /// The provider could not be reached.
    Transport { details: String },
    /// The provider answered with a body we could not interpret.
    InvalidResponse { details: String },
    /// Client configuration is unusable (bad base URL, ...).
    Configuration { details: String },
}

impl ProviderError {
    /// Returns the provider's own message for this error.
    ///
    /// Several endpoints pass this text through to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized { reason } => reason,
            Self::Rejected { message, .. } => message,
            Self::Transport { details }
            | Self::InvalidResponse { details }
            | Self::Configuration { details } => details,
        }
    }

    /// Returns true if the provider rejected the credentials themselves.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::Rejected { status, message } => {
                write!(f, "identity provider rejected request ({status}): {message}")
            }
            Self::Transport { details } => {
                write!(f, "identity provider unreachable: {details}")
            }
            Self::InvalidResponse { details } => {
                write!(f, "invalid identity provider response: {details}")
            }
            Self::Configuration { details } => {
                write!(f, "identity provider misconfigured: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from role profile storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStoreError {
    /// A profile already exists for this user.
    Conflict { user_id: UserId },
    /// No profile exists for this user.
    NotFound { user_id: UserId },
    /// The backing store failed.
    Backend { details: String },
}

impl ProfileStoreError {
    /// Returns the backend message, passed through verbatim by the API.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Backend { details } => details.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ProfileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { user_id } => write!(f, "profile already exists for {user_id}"),
            Self::NotFound { user_id } => write!(f, "no profile for {user_id}"),
            Self::Backend { details } => write!(f, "profile store error: {details}"),
        }
    }
}

impl std::error::Error for ProfileStoreError {}

/// Errors from vendor application storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStoreError {
    /// The user already has an application under consideration.
    AlreadyOpen { user_id: UserId },
    /// The backing store failed.
    Backend { details: String },
}

impl ApplicationStoreError {
    /// Returns the backend message, passed through verbatim by the API.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Backend { details } => details.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ApplicationStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen { user_id } => {
                write!(f, "{user_id} already has an open vendor application")
            }
            Self::Backend { details } => write!(f, "application store error: {details}"),
        }
    }
}

impl std::error::Error for ApplicationStoreError {}
