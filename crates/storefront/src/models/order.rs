//! Order domain types.
//!
//! An order is written once at checkout. Its line items and total are a
//! snapshot of the cart at that moment; only `status` (and `updated_at`)
//! change afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tokoku_core::{CheckoutKey, Email, OrderId, OrderLine, OrderStatus, Price};

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "ownerIdentity")]
    pub owner: Email,
    #[serde(rename = "lineItemsSnapshot")]
    pub line_items: Vec<OrderLine>,
    pub total_price: Price,
    pub status: OrderStatus,
    #[serde(rename = "requestId")]
    pub checkout_key: CheckoutKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner: Email,
    pub line_items: Vec<OrderLine>,
    pub total_price: Price,
    pub checkout_key: CheckoutKey,
}

/// Decode the stored line-items field.
///
/// Rows normally hold a JSON array. Rows written by older clients hold the
/// array serialized into a JSON string, so a string is decoded a second time.
///
/// # Errors
///
/// Returns the `serde_json` error when neither shape decodes.
pub fn parse_line_items(value: serde_json::Value) -> Result<Vec<OrderLine>, serde_json::Error> {
    match value {
        serde_json::Value::String(encoded) => serde_json::from_str(&encoded),
        serde_json::Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}
