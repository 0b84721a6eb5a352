//! eshop Storefront library.
//!
//! Everything a shopper touches lives here: the catalog and its size-based
//! pricing, the cart, checkout and the order recorder, plus the auth gate
//! that hands out admin capabilities to the `eshop-admin` crate.
//!
//! # Architecture
//!
//! - [`catalog`] - Products and the pricing resolver
//! - [`cart`] - Pure cart reducer and the [`cart::Cart`] wrapper
//! - [`checkout`] - Totals (GST, shipping) and the order recorder
//! - [`db`] - Repository trait with in-process stores for products, users and orders
//! - [`storage`] - Key/value persistence (file-backed or in-memory)
//! - [`services::auth`] - Login, registration and the admin/staff gate
//! - [`interchange`] - JSON export/import of collections
//! - [`state`] - The [`Storefront`] facade tying it together
//!
//! Every mutation runs synchronously to completion; there is no background
//! work and no shared state across threads.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod company;
pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod interchange;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use state::Storefront;
