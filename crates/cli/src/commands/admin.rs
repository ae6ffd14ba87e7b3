//! Admin role management commands.
//!
//! # Usage
//!
//! ```bash
//! tokoku admin grant -e admin@example.com
//! tokoku admin revoke -e admin@example.com
//! ```
//!
//! The user must already have registered through the storefront. A granted
//! role takes effect on the user's next `GET /api/auth/me` or sign-in.

use thiserror::Error;
use tokoku_core::Role;
use tokoku_storefront::db::Database;
use tokoku_storefront::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// No account with this email.
    #[error("No user registered with email: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Auth(AuthError),
}

/// Give `email` the admin role.
///
/// # Errors
///
/// Returns an error if the user does not exist or the database fails.
pub async fn grant(email: &str) -> Result<(), AdminError> {
    set_role(email, Role::Admin).await?;
    tracing::info!("Admin role granted to {email}");
    Ok(())
}

/// Return `email` to the customer role.
///
/// # Errors
///
/// Returns an error if the user does not exist or the database fails.
pub async fn revoke(email: &str) -> Result<(), AdminError> {
    set_role(email, Role::Customer).await?;
    tracing::info!("Admin role revoked from {email}");
    Ok(())
}

async fn set_role(email: &str, role: Role) -> Result<(), AdminError> {
    let db = Database::Postgres(connect().await?);

    AuthService::new(&db)
        .set_role(email, role)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AdminError::UnknownUser(email.to_owned()),
            other => AdminError::Auth(other),
        })
}
