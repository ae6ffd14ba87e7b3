//! Account profile persistence.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::UserId;

use super::RepositoryError;
use crate::models::profile::{Profile, ProfileUpdate};

/// Storage seam for account profiles.
pub trait ProfileStore: Send + Sync {
    fn get_profile(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Create or merge into the user's profile. `None` fields keep their
    /// stored value.
    fn upsert_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Profile, RepositoryError>> + Send;
}

impl<T: ProfileStore> ProfileStore for std::sync::Arc<T> {
    fn get_profile(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Profile>, RepositoryError>> + Send {
        (**self).get_profile(user_id)
    }

    fn upsert_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Profile, RepositoryError>> + Send {
        (**self).upsert_profile(user_id, update)
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: i64,
    address: Option<String>,
    phone: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            address: row.address,
            phone: row.phone,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` profile repository.
pub struct PgProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ProfileStore for PgProfileRepository<'_> {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT user_id, address, phone, updated_at
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn upsert_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO profiles (user_id, address, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET address = COALESCE(EXCLUDED.address, profiles.address),
                phone = COALESCE(EXCLUDED.phone, profiles.phone),
                updated_at = NOW()
            RETURNING user_id, address, phone, updated_at
            ",
        )
        .bind(user_id)
        .bind(update.address.as_deref())
        .bind(update.phone.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(Profile::from(row))
    }
}
