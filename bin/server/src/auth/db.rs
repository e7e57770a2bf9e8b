//! Database repository for role profiles.

use async_trait::async_trait;
use carnaval_core::UserId;
use carnaval_platform_access::{
    NewProfile, ProfileStore, ProfileStoreError, ProfileUpdate, Role, RoleProfile,
};
use chrono::{DateTime, Utc};
use rootcause::Report;
use sqlx::{FromRow, PgPool};

/// Row type for profile queries.
#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    full_name: Option<String>,
    role: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn try_into_profile(self) -> Result<RoleProfile, ProfileStoreError> {
        let role = Role::parse(&self.role).ok_or_else(|| ProfileStoreError::Backend {
            details: format!("invalid role '{}' for profile {}", self.role, self.id),
        })?;
        Ok(RoleProfile {
            id: UserId::new(self.id),
            email: self.email,
            full_name: self.full_name,
            role,
            phone: self.phone,
            avatar_url: self.avatar_url,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn backend(err: &sqlx::Error) -> ProfileStoreError {
    ProfileStoreError::Backend {
        details: err.to_string(),
    }
}

/// Returns true if `err` is a uniqueness constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Maps a failed insert. The primary key decides between concurrent
/// creations, so a clash there means the profile already exists.
fn insert_error(err: &sqlx::Error, user_id: &UserId) -> ProfileStoreError {
    if is_unique_violation(err) {
        ProfileStoreError::Conflict {
            user_id: user_id.clone(),
        }
    } else {
        backend(err)
    }
}

/// Repository for role profiles in the `user_profiles` table.
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Creates a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileRepository {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<RoleProfile>, Report<ProfileStoreError>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, email, full_name, role, phone, avatar_url, is_active, created_at, updated_at
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend(&e))?;

        match row {
            Some(r) => Ok(Some(r.try_into_profile()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewProfile) -> Result<RoleProfile, Report<ProfileStoreError>> {
        // Advisory only; the primary key settles concurrent inserts.
        if self.find_by_id(&new.id).await?.is_some() {
            return Err(ProfileStoreError::Conflict { user_id: new.id }.into());
        }

        let profile = RoleProfile::from_new(new);
        let row: ProfileRow = sqlx::query_as(
            r#"
            INSERT INTO user_profiles
                (id, email, full_name, role, phone, avatar_url, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, email, full_name, role, phone, avatar_url, is_active, created_at, updated_at
            "#,
        )
        .bind(profile.id.as_str())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.is_active)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(&e, &profile.id))?;

        tracing::info!(user_id = %profile.id, role = %profile.role, "Created role profile");
        Ok(row.try_into_profile()?)
    }

    async fn update(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<RoleProfile, Report<ProfileStoreError>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            UPDATE user_profiles
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = $5
            WHERE id = $1
            RETURNING id, email, full_name, role, phone, avatar_url, is_active, created_at, updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(&update.avatar_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend(&e))?;

        let row = row.ok_or_else(|| ProfileStoreError::NotFound {
            user_id: id.clone(),
        })?;
        Ok(row.try_into_profile()?)
    }
}
