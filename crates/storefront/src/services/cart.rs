//! Per-client cart.
//!
//! The cart lives in client-scoped key-value storage (the HTTP session in
//! production) under a single key, so it needs no server-side ownership and
//! survives order-backend outages. Every mutation persists the whole line
//! list in one write and then emits exactly one [`CartChanged`] event.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tower_sessions::Session;
use uuid::Uuid;

use tokoku_core::{CartLine, Price, PriceOverflow, ProductId, QtyDirection};

use crate::models::{Product, session_keys};

/// Buffered events per subscriber before slow receivers start lagging.
const EVENT_CAPACITY: usize = 256;

/// Errors from the cart's backing storage.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cart storage unavailable")]
    Unavailable,

    #[error("cart total too large: {0}")]
    TotalTooLarge(#[from] PriceOverflow),
}

// =============================================================================
// Storage seam
// =============================================================================

/// Client-scoped string storage.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>, CartError>> + Send;

    fn store(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), CartError>> + Send;
}

impl KeyValueStore for Session {
    async fn load(&self, key: &str) -> Result<Option<String>, CartError> {
        // Values are written as JSON strings; anything else is handed back
        // verbatim so the caller's parse fails and the cart reads as empty.
        Ok(self.get_value(key).await?.map(|value| match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    async fn store(&self, key: &str, value: String) -> Result<(), CartError> {
        self.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CartError> {
        self.remove_value(key).await?;
        Ok(())
    }
}

/// In-process storage for tests and tooling.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes fail with [`CartError::Unavailable`]; reads keep working.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), CartError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CartError::Unavailable);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, CartError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: String) -> Result<(), CartError> {
        self.check_writable()?;
        self.values.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CartError> {
        self.check_writable()?;
        self.values.lock().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Change notifications
// =============================================================================

/// Emitted after every persisted cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartChanged {
    pub cart_id: Uuid,
    pub item_count: u32,
}

/// Broadcast channel for [`CartChanged`] events.
///
/// Owned by the application state and handed to each [`CartStore`].
/// Delivery is best-effort: receivers that fall behind lose events.
#[derive(Debug, Clone)]
pub struct CartEvents {
    tx: broadcast::Sender<CartChanged>,
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl CartEvents {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.tx.subscribe()
    }

    fn notify(&self, event: CartChanged) {
        // No receivers is not an error.
        let _ = self.tx.send(event);
    }
}

// =============================================================================
// Cart store
// =============================================================================

/// Cart operations over one client's storage.
pub struct CartStore<K> {
    storage: K,
    events: CartEvents,
}

impl<K: KeyValueStore> CartStore<K> {
    #[must_use]
    pub const fn new(storage: K, events: CartEvents) -> Self {
        Self { storage, events }
    }

    /// Receive change events for every cart sharing this store's channel.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.events.subscribe()
    }

    /// Stable identifier of this client's cart, created on first use.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage cannot be read or written.
    pub async fn cart_id(&self) -> Result<Uuid, CartError> {
        if let Some(raw) = self.storage.load(session_keys::CART_ID).await?
            && let Ok(id) = raw.parse::<Uuid>()
        {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        self.storage
            .store(session_keys::CART_ID, id.to_string())
            .await?;
        Ok(id)
    }

    /// The persisted cart lines. Missing or malformed storage reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `CartError` only if storage itself fails.
    pub async fn get_cart(&self) -> Result<Vec<CartLine>, CartError> {
        let Some(raw) = self.storage.load(session_keys::CART).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(mut lines) => {
                lines.retain(|line| line.quantity > 0);
                Ok(lines)
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed cart");
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the persisted cart and notify observers.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be written.
    pub async fn save_cart(&self, lines: &[CartLine]) -> Result<(), CartError> {
        let encoded = serde_json::to_string(lines)?;
        self.storage.store(session_keys::CART, encoded).await?;
        self.emit(item_count(lines)).await
    }

    /// Add one unit of `product`, denormalizing its title, price and image.
    ///
    /// # Errors
    ///
    /// Returns `TotalTooLarge` (nothing saved) if the cart total would pass
    /// [`Price::MAX`], or `CartError` if storage fails.
    pub async fn add_to_cart(&self, product: &Product) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.get_cart().await?;
        add_line(&mut lines, product);
        cart_total(&lines)?;
        self.save_cart(&lines).await?;
        Ok(lines)
    }

    /// Step a line's quantity. Decreasing from 1 removes the line; an unknown
    /// product leaves the lines as they were (still saved and notified).
    ///
    /// # Errors
    ///
    /// Returns `TotalTooLarge` (nothing saved) if an increase would pass
    /// [`Price::MAX`], or `CartError` if storage fails.
    pub async fn update_qty(
        &self,
        product_id: ProductId,
        direction: QtyDirection,
    ) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.get_cart().await?;
        step_quantity(&mut lines, product_id, direction);
        if direction == QtyDirection::Increase {
            cart_total(&lines)?;
        }
        self.save_cart(&lines).await?;
        Ok(lines)
    }

    /// Drop the line for `product_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn remove_from_cart(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.get_cart().await?;
        lines.retain(|line| line.product_id != product_id);
        self.save_cart(&lines).await?;
        Ok(lines)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        self.storage.remove(session_keys::CART).await?;
        self.emit(0).await
    }

    /// Total units across all lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn get_cart_count(&self) -> Result<u32, CartError> {
        Ok(item_count(&self.get_cart().await?))
    }

    async fn emit(&self, item_count: u32) -> Result<(), CartError> {
        let cart_id = self.cart_id().await?;
        self.events.notify(CartChanged {
            cart_id,
            item_count,
        });
        Ok(())
    }
}

/// Σ quantity over `lines`.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u32 {
    lines.iter().fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
}

/// Σ unit price × quantity over `lines`.
///
/// # Errors
///
/// Returns `PriceOverflow` if a line or the total passes [`Price::MAX`].
pub fn cart_total(lines: &[CartLine]) -> Result<Price, PriceOverflow> {
    let totals = lines
        .iter()
        .map(CartLine::line_total)
        .collect::<Result<Vec<_>, _>>()?;
    Price::checked_sum(totals)
}

fn add_line(lines: &mut Vec<CartLine>, product: &Product) {
    if let Some(line) = lines.iter_mut().find(|l| l.product_id == product.id) {
        line.quantity = line.quantity.saturating_add(1);
        return;
    }
    lines.push(CartLine {
        product_id: product.id,
        title: product.title.clone(),
        unit_price: product.price,
        image: product.image.clone(),
        quantity: 1,
    });
}

fn step_quantity(lines: &mut Vec<CartLine>, product_id: ProductId, direction: QtyDirection) {
    let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) else {
        return;
    };
    line.quantity = match direction {
        QtyDirection::Increase => line.quantity.saturating_add(1),
        QtyDirection::Decrease => line.quantity.saturating_sub(1),
    };
    lines.retain(|l| l.quantity > 0);
}
