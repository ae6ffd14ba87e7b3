//! Tokoku Core - Shared domain types.
//!
//! This crate provides the types used across all Tokoku components:
//! - `storefront` - JSON API for catalog, cart, checkout and orders
//! - `cli` - Command-line tools for migrations, roles and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The cart line arithmetic and the order status machine live
//! here so that every consumer applies the same invariants.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, emails, cart/order lines, statuses and identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
