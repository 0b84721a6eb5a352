//! Integration tests for eshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Browse, cart and checkout against the demo store
//! - `admin_gating` - Capabilities for customers, employees and admins
//! - `persistence` - Reopening a data directory and moving data between stores
//!
//! Helpers shared by the test files live here.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use eshop_core::{LocalizedList, LocalizedText, Price, ProductId};
use eshop_storefront::Storefront;
use eshop_storefront::catalog::Product;
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::demo::DemoData;
use eshop_storefront::models::order::ShippingAddress;
use eshop_storefront::services::auth::AuthGate;

/// In-memory storefront holding the demo store.
#[must_use]
pub fn demo_storefront() -> Storefront {
    let mut storefront = Storefront::in_memory(StorefrontConfig::default());
    storefront
        .seed(&AuthGate::operator(), DemoData::load().unwrap())
        .unwrap();
    storefront
}

/// A product without sizes.
#[must_use]
pub fn simple_product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::from(id),
        name: LocalizedText::english(name),
        description: LocalizedText::english(format!("{name} for testing")),
        price: Price::from_units(price),
        original_price: Price::from_units(price),
        category: "TEST".to_owned(),
        images: Vec::new(),
        sizes: Vec::new(),
        size_options: Vec::new(),
        in_stock: None,
        features: LocalizedList::default(),
    }
}

#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Verma".to_owned(),
        address: "14 Industrial Estate".to_owned(),
        city: "Pune".to_owned(),
        postal_code: "411001".to_owned(),
        country: "India".to_owned(),
        phone: "+91-98220-00000".to_owned(),
    }
}

#[must_use]
pub fn order_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap()
}
