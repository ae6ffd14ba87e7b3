//! Core types for Tokoku.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod line;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use line::{CartLine, OrderLine, QtyDirection, snapshot_lines, snapshot_total};
pub use price::{CurrencyCode, Price, PriceOverflow};
pub use status::*;
