//! User repository for database operations.
//!
//! Accounts are keyed by normalized email. Password hashes never leave this
//! module except through [`UserStore::get_password_hash`].

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::{Email, Role, UserId};

use super::{RepositoryError, conflict_or_database};
use crate::models::user::User;

/// Storage seam for user accounts.
pub trait UserStore: Send + Sync {
    /// Create a user with the customer role.
    ///
    /// Fails with `RepositoryError::Conflict` if the email is taken.
    fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// The user and their argon2 PHC hash string.
    fn get_password_hash(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Change a user's role. Returns `false` if no such user exists.
    fn set_role(
        &self,
        email: &Email,
        role: Role,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

impl<T: UserStore> UserStore for std::sync::Arc<T> {
    fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send {
        (**self).create(email, full_name, password_hash)
    }

    fn get_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send {
        (**self).get_by_email(email)
    }

    fn get_password_hash(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send {
        (**self).get_password_hash(email)
    }

    fn set_role(
        &self,
        email: &Email,
        role: Role,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        (**self).set_role(email, role)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    full_name: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            email,
            full_name: r.full_name,
            role: r.role,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// `PostgreSQL` user repository.
pub struct PgUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgUserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserRepository<'_> {
    async fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, full_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, full_name, role, created_at
            ",
        )
        .bind(email.as_str())
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "email"))?;

        User::try_from(row)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, full_name, role, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, full_name, role, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((User::try_from(r.user)?, r.password_hash)))
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE email = $1")
            .bind(email.as_str())
            .bind(role)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
