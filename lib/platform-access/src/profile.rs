//! Role profiles: this system's own record of a user's role.
//!
//! Exactly one profile exists per identity, keyed by the identity id. It is
//! created at sign-up, updated only by its owner, and never deleted here.

use crate::role::Role;
use carnaval_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's role profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// Same as the identity id.
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleProfile {
    /// Builds a fresh, active profile from a creation request.
    ///
    /// The full name defaults to the e-mail when none was given.
    #[must_use]
    pub fn from_new(new: NewProfile) -> Self {
        let now = Utc::now();
        let full_name = new
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| new.email.clone());
        Self {
            id: new.id,
            email: new.email,
            full_name: Some(full_name),
            role: new.role,
            phone: new.phone,
            avatar_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in place and bumps `updated_at`.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(full_name) = &update.full_name {
            self.full_name = Some(full_name.clone());
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Request to create a role profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
}

impl NewProfile {
    /// Creates a request for a customer profile.
    #[must_use]
    pub fn new(id: UserId, email: String) -> Self {
        Self {
            id,
            email,
            full_name: None,
            role: Role::Customer,
            phone: None,
        }
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: Option<String>) -> Self {
        self.full_name = full_name;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }
}

/// Partial update a user may apply to their own profile.
///
/// Role, activation, and e-mail are not self-service; unknown fields in the
/// request body are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.avatar_url.is_none()
    }
}
