//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login
//! - `cart` - Per-client cart over session storage, with change events
//! - `catalog` - Cached product reads
//! - `orders` - Checkout, status life-cycle and order reads

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::{CartChanged, CartError, CartEvents, CartStore, KeyValueStore, MemoryStorage};
pub use catalog::Catalog;
pub use orders::{OrderError, OrderService, StatusOutcome};
