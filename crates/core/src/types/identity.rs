//! Authenticated identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::status::Role;

/// The signed-in user as seen by the order and cart services.
///
/// Stored in the session after login. Authorization decisions go through
/// [`Identity::has_role`] rather than comparing email addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// Create an identity.
    #[must_use]
    pub const fn new(user_id: UserId, email: Email, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    /// Whether this identity carries `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Whether this identity is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Whether this identity owns resources keyed by `owner`.
    #[must_use]
    pub fn owns(&self, owner: &Email) -> bool {
        &self.email == owner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_a_role_not_an_address() {
        let lookalike = Identity::new(
            UserId::new(1),
            Email::parse("admin@gmail.com").unwrap(),
            Role::Customer,
        );
        assert!(!lookalike.is_admin());

        let admin = Identity::new(
            UserId::new(2),
            Email::parse("ops@tokoku.id").unwrap(),
            Role::Admin,
        );
        assert!(admin.has_role(Role::Admin));
    }

    #[test]
    fn test_owns_compares_normalized_email() {
        let me = Identity::new(
            UserId::new(1),
            Email::parse("user@x.com").unwrap(),
            Role::Customer,
        );
        assert!(me.owns(&Email::parse("USER@x.com").unwrap()));
        assert!(!me.owns(&Email::parse("other@x.com").unwrap()));
    }
}
