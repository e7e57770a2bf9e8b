//! Storage seams for role profiles and vendor applications.

use crate::error::{ApplicationStoreError, ProfileStoreError};
use crate::profile::{NewProfile, ProfileUpdate, RoleProfile};
use crate::vendor::{ApplicationStats, ApplicationStatus, VendorApplication};
use async_trait::async_trait;
use carnaval_core::{ApplicationId, UserId};
use chrono::{DateTime, Utc};
use rootcause::Report;

/// Point-addressed storage of role profiles, keyed by identity id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Looks up the profile for `id`.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<RoleProfile>, Report<ProfileStoreError>>;

    /// Creates a profile.
    ///
    /// Fails with [`ProfileStoreError::Conflict`] if one already exists.
    /// The existence check is advisory; the backend's uniqueness constraint
    /// decides concurrent creations.
    async fn create(&self, new: NewProfile) -> Result<RoleProfile, Report<ProfileStoreError>>;

    /// Applies a partial update to the profile for `id`.
    async fn update(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<RoleProfile, Report<ProfileStoreError>>;

    /// Looks up the profile for `id`, treating any failure as "no profile".
    ///
    /// Read paths fail open to absence: the error is logged and dropped.
    async fn get(&self, id: &UserId) -> Option<RoleProfile> {
        match self.find_by_id(id).await {
            Ok(profile) => profile,
            Err(report) => {
                tracing::warn!(user_id = %id, error = %report, "Failed to fetch role profile");
                None
            }
        }
    }
}

/// Storage of vendor applications.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Stores a newly submitted application.
    ///
    /// Fails with [`ApplicationStoreError::AlreadyOpen`] if the applicant
    /// already has a pending or under-review application.
    async fn create(
        &self,
        application: VendorApplication,
    ) -> Result<VendorApplication, Report<ApplicationStoreError>>;

    /// Returns the user's most recently submitted application.
    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VendorApplication>, Report<ApplicationStoreError>>;

    /// Looks up an application by id.
    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<VendorApplication>, Report<ApplicationStoreError>>;

    /// Lists applications, newest first, optionally only those in `status`.
    async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, Report<ApplicationStoreError>>;

    /// Computes dashboard figures over every application as of `now`.
    async fn stats(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ApplicationStats, Report<ApplicationStoreError>> {
        let applications = self.list(None).await?;
        Ok(ApplicationStats::tally(&applications, now))
    }
}
