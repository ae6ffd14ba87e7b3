//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod order;
pub mod product;
pub mod profile;
pub mod review;
pub mod session;
pub mod user;

pub use order::{NewOrder, Order};
pub use product::{NewProduct, Product};
pub use profile::{Profile, ProfileUpdate};
pub use review::{NewReview, Review, ReviewSummary};
pub use session::keys as session_keys;
pub use user::User;
