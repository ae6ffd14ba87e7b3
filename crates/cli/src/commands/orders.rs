//! Order inspection and operator overrides.
//!
//! # Usage
//!
//! ```bash
//! tokoku orders list
//! tokoku orders list --owner customer@example.com
//! tokoku orders show 42
//! tokoku orders set-status 42 cancelled
//! ```

use tracing::info;

use tokoku_core::{Email, OrderId, OrderStatus};
use tokoku_storefront::db::Database;
use tokoku_storefront::models::Order;
use tokoku_storefront::services::OrderService;

use super::connect;

fn summary(order: &Order) -> String {
    format!(
        "#{} {} {} {} total={} lines={}",
        order.id,
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.owner,
        order.status,
        order.total_price,
        order.line_items.len()
    )
}

/// List orders, newest first, optionally for one owner.
///
/// # Errors
///
/// Returns an error if the email is invalid or the database fails.
pub async fn list(owner: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let owner = owner.map(Email::parse).transpose()?;
    let db = Database::Postgres(connect().await?);
    let service = OrderService::new(&db);

    let orders = match &owner {
        Some(email) => service.list_by_owner(email, false).await?,
        None => service.list_all().await?,
    };

    info!("{} orders", orders.len());
    for order in &orders {
        info!("  {}", summary(order));
    }
    Ok(())
}

/// Show one order with its line items.
///
/// # Errors
///
/// Returns an error if the order does not exist or the database fails.
pub async fn show(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::Postgres(connect().await?);
    let order = OrderService::new(&db).get_by_id(OrderId::new(id)).await?;

    info!("{}", summary(&order));
    info!("  request id: {}", order.checkout_key);
    info!("  updated:    {}", order.updated_at.to_rfc3339());
    for line in &order.line_items {
        info!(
            "  {} x {} @ {} = {}",
            line.quantity,
            line.title,
            line.unit_price,
            line.line_total()?
        );
    }
    Ok(())
}

/// Set an order's status as the operator. The life-cycle rules still apply:
/// completed and cancelled orders cannot change.
///
/// # Errors
///
/// Returns an error for an unknown status, a missing order, an illegal
/// transition, or a database failure.
pub async fn set_status(id: i64, status: &str) -> Result<(), Box<dyn std::error::Error>> {
    let status: OrderStatus = status.parse()?;
    let db = Database::Postgres(connect().await?);

    let outcome = OrderService::new(&db)
        .force_status(OrderId::new(id), status)
        .await?;

    info!("#{id}: {}", outcome.message());
    Ok(())
}
