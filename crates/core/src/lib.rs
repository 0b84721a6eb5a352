//! eshop Core - Shared domain types.
//!
//! This crate provides the types used across all eshop components:
//! - `storefront` - Catalog, pricing, cart, checkout and persistence
//! - `admin` - Management services for products, users, orders and company settings
//! - `cli` - Command-line tools for seeding, import/export and order operations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, languages and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
