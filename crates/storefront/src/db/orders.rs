//! Order persistence.
//!
//! Orders are inserted once per checkout key and afterwards only their status
//! moves. Status writes are compare-and-set so two concurrent transitions on
//! the same order cannot both succeed.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use tokoku_core::{CheckoutKey, Email, OrderId, OrderStatus, Price};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, parse_line_items};

/// Result of [`OrderStore::create_if_absent`].
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    /// `false` when an order with the same checkout key already existed and
    /// was returned instead.
    pub created: bool,
}

/// Storage seam for orders.
pub trait OrderStore: Send + Sync {
    /// Insert `order` unless one with the same checkout key exists, in which
    /// case the existing order is returned untouched.
    fn create_if_absent(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<CreatedOrder, RepositoryError>> + Send;

    fn get(&self, id: OrderId)
    -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn get_by_checkout_key(
        &self,
        key: CheckoutKey,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Set `new_status` only if the stored status still equals `expected`.
    ///
    /// Returns `None` when the order is missing or its status moved.
    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Orders owned by `owner`, newest first.
    fn list_by_owner(
        &self,
        owner: &Email,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Every order, newest first.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;
}

impl<T: OrderStore> OrderStore for std::sync::Arc<T> {
    fn create_if_absent(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<CreatedOrder, RepositoryError>> + Send {
        (**self).create_if_absent(order)
    }

    fn get(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send {
        (**self).get(id)
    }

    fn get_by_checkout_key(
        &self,
        key: CheckoutKey,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send {
        (**self).get_by_checkout_key(key)
    }

    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send {
        (**self).update_status(id, expected, new_status)
    }

    fn list_by_owner(
        &self,
        owner: &Email,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send {
        (**self).list_by_owner(owner)
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send {
        (**self).list_all()
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    owner_email: String,
    line_items: serde_json::Value,
    total_price: Decimal,
    status: OrderStatus,
    checkout_key: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let owner = Email::parse(&row.owner_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid owner email on order {}: {e}", row.id))
        })?;
        let line_items = parse_line_items(row.line_items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid line items on order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            owner,
            line_items,
            total_price: Price::new(row.total_price),
            status: row.status,
            checkout_key: CheckoutKey::from_uuid(row.checkout_key),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, owner_email, line_items, total_price, status, checkout_key, created_at, updated_at";

/// `PostgreSQL` order repository.
pub struct PgOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgOrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for PgOrderRepository<'_> {
    async fn create_if_absent(&self, order: &NewOrder) -> Result<CreatedOrder, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO orders (owner_email, line_items, total_price, status, checkout_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (checkout_key) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "
        );
        let inserted = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.owner.as_str())
            .bind(Json(&order.line_items))
            .bind(order.total_price)
            .bind(OrderStatus::PendingPayment)
            .bind(order.checkout_key)
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(CreatedOrder {
                order: Order::try_from(row)?,
                created: true,
            });
        }

        // Lost the race to (or retried after) an earlier insert with this key.
        let existing = self
            .get_by_checkout_key(order.checkout_key)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(CreatedOrder {
            order: existing,
            created: false,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn get_by_checkout_key(
        &self,
        key: CheckoutKey,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_key = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(expected)
            .bind(new_status)
            .fetch_optional(self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_by_owner(&self, owner: &Email) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE owner_email = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(owner.as_str())
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}
