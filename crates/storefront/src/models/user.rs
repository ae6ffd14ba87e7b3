//! User domain types.

use chrono::{DateTime, Utc};

use tokoku_core::{Email, Identity, Role, UserId};

/// A registered storefront user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (also the owner identity of their orders).
    pub email: Email,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Authorization role.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The identity stored in the session after login.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.email.clone(), self.role)
    }
}
