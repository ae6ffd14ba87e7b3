//! Cart and order line items.
//!
//! A [`CartLine`] is mutable client-side state. An [`OrderLine`] is its frozen
//! copy inside an order: once written it is never edited, and the order total
//! is computed from these lines exactly once.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{Price, PriceOverflow};

/// One product-quantity entry held per client before checkout.
///
/// Title, price and image are copied from the catalog when the line is first
/// added and are never re-synced afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (`unit_price * quantity`).
    ///
    /// # Errors
    ///
    /// Returns `PriceOverflow` past [`Price::MAX`].
    pub fn line_total(&self) -> Result<Price, PriceOverflow> {
        self.unit_price.checked_mul(self.quantity).ok_or(PriceOverflow)
    }
}

/// Frozen copy of a cart line stored inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl OrderLine {
    /// Price of this line (`unit_price * quantity`).
    ///
    /// # Errors
    ///
    /// Returns `PriceOverflow` past [`Price::MAX`].
    pub fn line_total(&self) -> Result<Price, PriceOverflow> {
        self.unit_price.checked_mul(self.quantity).ok_or(PriceOverflow)
    }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            title: line.title.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// Direction of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QtyDirection {
    #[serde(alias = "add")]
    Increase,
    #[serde(alias = "minus")]
    Decrease,
}

/// Copy cart lines verbatim into order lines.
#[must_use]
pub fn snapshot_lines(cart: &[CartLine]) -> Vec<OrderLine> {
    cart.iter().map(OrderLine::from).collect()
}

/// Sum of `unit_price * quantity` over a snapshot.
///
/// # Errors
///
/// Returns `PriceOverflow` if a line or the total passes [`Price::MAX`].
pub fn snapshot_total(lines: &[OrderLine]) -> Result<Price, PriceOverflow> {
    let totals = lines
        .iter()
        .map(OrderLine::line_total)
        .collect::<Result<Vec<_>, _>>()?;
    Price::checked_sum(totals)
}
