//! Session-related types.

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in [`tokoku_core::Identity`].
    pub const IDENTITY: &str = "identity";

    /// Key holding the serialized cart lines.
    pub const CART: &str = "cart";

    /// Key holding the stable cart identifier used to scope change events.
    pub const CART_ID: &str = "cart_id";
}
