//! Checkout, order status changes and order reads.
//!
//! # Checkout
//!
//! The cart is read once; that vector is the snapshot. The order is written
//! with create-if-absent semantics keyed by the client's checkout key, so a
//! retried request returns the order the first attempt wrote. The cart is
//! cleared only after the order exists, and on a replay only when it still
//! holds the lines that order was made from.
//!
//! # Status
//!
//! `pending_payment` moves to `completed` or `cancelled`; both are terminal.
//! Writes are compare-and-set on the status the caller observed.
//!
//! # Visibility
//!
//! Owners see their own orders, admins see all of them. Orders an actor may
//! not see are reported exactly like missing ones.

use thiserror::Error;
use tracing::instrument;

use tokoku_core::{
    CheckoutKey, Email, Identity, IllegalTransition, InvalidStatus, OrderId, OrderStatus,
    PriceOverflow, Transition, snapshot_lines, snapshot_total,
};

use super::cart::{CartError, CartStore, KeyValueStore};
use crate::db::{CreatedOrder, OrderStore, RepositoryError};
use crate::models::{NewOrder, Order};

/// Errors from checkout and order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("sign in to place or view orders")]
    NotAuthenticated,

    #[error("cart is empty")]
    EmptyCart,

    #[error("order total too large: {0}")]
    TotalTooLarge(#[from] PriceOverflow),

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("order storage failed: {0}")]
    PersistenceFailure(#[source] RepositoryError),

    #[error("cart storage failed: {0}")]
    Cart(#[from] CartError),
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::OrderNotFound,
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::PersistenceFailure(other),
        }
    }
}

/// Result of a status change request.
#[derive(Debug, Clone)]
pub enum StatusOutcome {
    /// The new status was written.
    Updated(Order),
    /// The order already had the requested status; nothing was written.
    Unchanged(Order),
}

impl StatusOutcome {
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Updated(order) | Self::Unchanged(order) => order,
        }
    }

    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Updated(order) | Self::Unchanged(order) => order,
        }
    }

    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged(_))
    }

    /// Message suitable for showing to the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Updated(order) => format!("order status updated to {}", order.status),
            Self::Unchanged(order) => format!("order is already {}", order.status),
        }
    }
}

/// Who is asking for a status change, which decides whether `completed` may
/// be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusAuthority {
    /// A status update request: owners may only cancel.
    Request,
    /// The owner confirming their own payment.
    PaymentConfirmation,
    /// An operator tool; no ownership checks.
    Operator,
}

/// Order operations over an [`OrderStore`].
pub struct OrderService<'a, S> {
    orders: &'a S,
}

impl<'a, S: OrderStore> OrderService<'a, S> {
    #[must_use]
    pub const fn new(orders: &'a S) -> Self {
        Self { orders }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Turn the cart into an order.
    ///
    /// Returns the order and whether it was created by this call (`false`
    /// when `checkout_key` was already used by the same owner).
    ///
    /// # Errors
    ///
    /// - `EmptyCart` if the cart has no lines (checked first)
    /// - `NotAuthenticated` if `owner` is `None`
    /// - `TotalTooLarge` if the total passes the largest storable price
    /// - `Conflict` if `checkout_key` belongs to another owner's order, or to
    ///   an order made from different lines than the cart now holds; the cart
    ///   is left as it was
    /// - `PersistenceFailure` if the order cannot be written; the cart is left
    ///   as it was
    #[instrument(skip_all, fields(checkout_key = %checkout_key))]
    pub async fn checkout<K: KeyValueStore>(
        &self,
        owner: Option<&Identity>,
        checkout_key: CheckoutKey,
        cart: &CartStore<K>,
    ) -> Result<CreatedOrder, OrderError> {
        let lines = cart.get_cart().await?;

        if lines.is_empty() {
            // A retry whose first attempt already cleared the cart.
            if let Some(owner) = owner
                && let Some(existing) = self.orders.get_by_checkout_key(checkout_key).await?
                && owner.owns(&existing.owner)
            {
                return Ok(CreatedOrder {
                    order: existing,
                    created: false,
                });
            }
            return Err(OrderError::EmptyCart);
        }
        let owner = owner.ok_or(OrderError::NotAuthenticated)?;

        let line_items = snapshot_lines(&lines);
        let total_price = snapshot_total(&line_items)?;
        let new_order = NewOrder {
            owner: owner.email.clone(),
            line_items,
            total_price,
            checkout_key,
        };

        let result = self.orders.create_if_absent(&new_order).await.map_err(|e| {
            tracing::error!(error = %e, "failed to persist order; cart left intact");
            OrderError::PersistenceFailure(e)
        })?;

        if !owner.owns(&result.order.owner) {
            return Err(OrderError::Conflict(
                "checkout key already used by another order".to_string(),
            ));
        }

        if !result.created && result.order.line_items != new_order.line_items {
            tracing::warn!(
                order_id = %result.order.id,
                "checkout key replayed with a different cart; cart left intact"
            );
            return Err(OrderError::Conflict(
                "checkout key already used for a different cart".to_string(),
            ));
        }

        if result.created {
            tracing::info!(
                order_id = %result.order.id,
                owner = %result.order.owner,
                total = %result.order.total_price,
                lines = result.order.line_items.len(),
                "order created"
            );
        } else {
            tracing::info!(order_id = %result.order.id, "checkout replayed existing order");
        }

        if let Err(e) = cart.clear_cart().await {
            // The order stands; the customer still sees the old cart.
            tracing::error!(
                order_id = %result.order.id,
                checkout_key = %checkout_key,
                error = %e,
                "order created but cart could not be cleared"
            );
        }

        Ok(result)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Parse `new_status` and apply it on behalf of `actor`.
    ///
    /// Owners may cancel their own pending orders; only admins may mark an
    /// order completed through this path (owners use [`Self::confirm_payment`]).
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus`, `OrderNotFound`, `Forbidden`,
    /// `IllegalTransition` or `PersistenceFailure`.
    #[instrument(skip_all, fields(actor = %actor.email, order_id = %order_id))]
    pub async fn set_status(
        &self,
        actor: &Identity,
        order_id: OrderId,
        new_status: &str,
    ) -> Result<StatusOutcome, OrderError> {
        let new_status = new_status.parse::<OrderStatus>()?;
        self.update_status_as(actor, order_id, new_status).await
    }

    /// Apply an already-parsed status on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// See [`Self::set_status`].
    pub async fn update_status_as(
        &self,
        actor: &Identity,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<StatusOutcome, OrderError> {
        self.transition(Some(actor), order_id, new_status, StatusAuthority::Request)
            .await
    }

    /// The owner (or an admin) confirms payment, completing the order.
    /// Confirming an already completed order is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `IllegalTransition` (the order was cancelled)
    /// or `PersistenceFailure`.
    #[instrument(skip_all, fields(actor = %actor.email, order_id = %order_id))]
    pub async fn confirm_payment(
        &self,
        actor: &Identity,
        order_id: OrderId,
    ) -> Result<StatusOutcome, OrderError> {
        self.transition(
            Some(actor),
            order_id,
            OrderStatus::Completed,
            StatusAuthority::PaymentConfirmation,
        )
        .await
    }

    /// Apply a status without an acting identity (operator tooling). The
    /// life-cycle rules still hold.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `IllegalTransition` or `PersistenceFailure`.
    pub async fn force_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<StatusOutcome, OrderError> {
        self.transition(None, order_id, new_status, StatusAuthority::Operator)
            .await
    }

    async fn transition(
        &self,
        actor: Option<&Identity>,
        order_id: OrderId,
        new_status: OrderStatus,
        authority: StatusAuthority,
    ) -> Result<StatusOutcome, OrderError> {
        let order = match actor {
            Some(actor) => self.get_for(actor, order_id).await?,
            None => self
                .orders
                .get(order_id)
                .await?
                .ok_or(OrderError::OrderNotFound)?,
        };

        let is_admin = actor.is_some_and(Identity::is_admin);
        if authority == StatusAuthority::Request
            && new_status == OrderStatus::Completed
            && !is_admin
            && order.status != OrderStatus::Completed
        {
            return Err(OrderError::Forbidden(
                "confirm payment to complete an order".to_string(),
            ));
        }

        match order.status.transition_to(new_status)? {
            Transition::Unchanged => return Ok(StatusOutcome::Unchanged(order)),
            Transition::Apply => {}
        }

        let updated = self
            .orders
            .update_status(order_id, order.status, new_status)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to update order status");
                OrderError::PersistenceFailure(e)
            })?;

        if let Some(updated) = updated {
            tracing::info!(
                from = %order.status,
                to = %updated.status,
                "order status changed"
            );
            return Ok(StatusOutcome::Updated(updated));
        }

        // Lost a race: report against whatever the winner wrote.
        let current = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        match current.status.transition_to(new_status)? {
            Transition::Unchanged => Ok(StatusOutcome::Unchanged(current)),
            Transition::Apply => Err(OrderError::IllegalTransition(IllegalTransition {
                from: current.status,
                to: new_status,
            })),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// An order by id, without visibility checks.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `PersistenceFailure`.
    pub async fn get_by_id(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// An order visible to `actor`.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` when the order is missing or not visible.
    pub async fn get_for(&self, actor: &Identity, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self.get_by_id(order_id).await?;
        if actor.owns(&order.owner) || actor.is_admin() {
            Ok(order)
        } else {
            Err(OrderError::OrderNotFound)
        }
    }

    /// Orders for `owner`, newest first; every order when `include_all`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store cannot be read.
    pub async fn list_by_owner(
        &self,
        owner: &Email,
        include_all: bool,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = if include_all {
            self.orders.list_all().await?
        } else {
            self.orders.list_by_owner(owner).await?
        };
        Ok(orders)
    }

    /// Orders visible to `actor`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store cannot be read.
    pub async fn list_for(&self, actor: &Identity) -> Result<Vec<Order>, OrderError> {
        self.list_by_owner(&actor.email, actor.is_admin()).await
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_all().await?)
    }
}
