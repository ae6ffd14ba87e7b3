//! Order status life-cycle and user roles.
//!
//! ```text
//! PendingPayment ──confirm──▶ Completed
//!        │
//!        └──────cancel─────▶ Cancelled
//! ```
//!
//! Both `Completed` and `Cancelled` are terminal.

use serde::{Deserialize, Serialize};

/// Status of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, waiting for the owner to confirm payment.
    #[default]
    PendingPayment,
    /// Payment confirmed.
    Completed,
    /// Abandoned or rejected.
    Cancelled,
}

/// Result of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order moves to the new status.
    Apply,
    /// The order already has the requested status; nothing to write.
    Unchanged,
}

/// A status change that would leave a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move order from {from} to {to}")]
pub struct IllegalTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A status string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct InvalidStatus(pub String);

impl OrderStatus {
    /// All statuses, in life-cycle order.
    pub const ALL: [Self; 3] = [Self::PendingPayment, Self::Completed, Self::Cancelled];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Check a change from `self` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` when `self` is terminal and `to` differs.
    pub fn transition_to(self, to: Self) -> Result<Transition, IllegalTransition> {
        if self == to {
            return Ok(Transition::Unchanged);
        }
        match (self, to) {
            (Self::PendingPayment, Self::Completed | Self::Cancelled) => Ok(Transition::Apply),
            (from, to) => Err(IllegalTransition { from, to }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = InvalidStatus;

    /// Accepts wire names and the display names older clients send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending_payment" | "Menunggu Pembayaran" | "Sedang diproses" => {
                Ok(Self::PendingPayment)
            }
            "completed" | "Berhasil" => Ok(Self::Completed),
            "cancelled" | "Dibatalkan" => Ok(Self::Cancelled),
            other => Err(InvalidStatus(other.to_owned())),
        }
    }
}

/// Role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper; sees only their own orders.
    #[default]
    Customer,
    /// Store administrator; sees all orders and manages the catalog.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_moves_to_terminal_states() {
        assert_eq!(
            OrderStatus::PendingPayment.transition_to(OrderStatus::Completed),
            Ok(Transition::Apply)
        );
        assert_eq!(
            OrderStatus::PendingPayment.transition_to(OrderStatus::Cancelled),
            Ok(Transition::Apply)
        );
    }

    #[test]
    fn test_same_status_is_unchanged() {
        for status in OrderStatus::ALL {
            assert_eq!(status.transition_to(status), Ok(Transition::Unchanged));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                if to != from {
                    assert_eq!(
                        from.transition_to(to),
                        Err(IllegalTransition { from, to })
                    );
                }
            }
        }
        assert!(!OrderStatus::PendingPayment.is_terminal());
    }

    #[test]
    fn test_parse_wire_and_legacy_names() {
        assert_eq!("completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert_eq!("Berhasil".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert_eq!(
            "Sedang diproses".parse::<OrderStatus>(),
            Ok(OrderStatus::PendingPayment)
        );
        assert_eq!("Dibatalkan".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(InvalidStatus("shipped".to_owned()))
        );
    }

    #[test]
    fn test_status_serde_uses_wire_names() {
        let json = serde_json::to_string(&OrderStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"pending_payment\"");
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Customer, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }
}
