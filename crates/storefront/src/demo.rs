//! Bundled demo data: a small heater catalog, a week of orders, staff and
//! customer accounts, and the default company record.
//!
//! Demo passwords are only kept long enough to hash them.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use eshop_core::{Email, UserId, UserRole};

use crate::catalog::Product;
use crate::company::CompanySettings;
use crate::models::order::Order;
use crate::models::user::User;
use crate::services::auth::{AuthError, hash_password};

const DEMO_JSON: &str = include_str!("../data/demo.json");

/// Errors from loading the demo data.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("demo data is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not hash demo password: {0}")]
    Auth(#[from] AuthError),
}

/// A demo account as shipped, with its clear-text password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUser {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub email: Email,
    pub is_active: bool,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl DemoUser {
    /// Hash the password and build the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn into_user(self) -> Result<User, AuthError> {
        Ok(User {
            id: self.id,
            username: self.username,
            password_hash: hash_password(&self.password)?,
            role: self.role,
            name: self.name,
            email: self.email,
            is_active: self.is_active,
            created_at: self.created_at,
            last_login: None,
            phone: self.phone,
            address: self.address,
        })
    }
}

/// Everything needed to populate an empty store.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoData {
    pub company: CompanySettings,
    pub products: Vec<Product>,
    pub users: Vec<DemoUser>,
    pub orders: Vec<Order>,
}

impl DemoData {
    /// Parse the bundled data.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::Parse` if the bundled JSON is broken.
    pub fn load() -> Result<Self, DemoError> {
        Ok(serde_json::from_str(DEMO_JSON)?)
    }

    /// Demo users with hashed passwords.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::Auth` if hashing fails.
    pub fn hashed_users(&self) -> Result<Vec<User>, DemoError> {
        self.users
            .iter()
            .cloned()
            .map(|user| user.into_user().map_err(DemoError::from))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_core::{OrderStatus, Price};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::order::OrderStats;

    #[test]
    fn test_demo_data_parses_and_validates() {
        let demo = DemoData::load().unwrap();
        assert!(demo.company.validate().is_ok());
        assert_eq!(demo.company.tax_settings.gst_rate, Decimal::from(18));
        assert_eq!(
            demo.company.shipping_settings.free_shipping_threshold,
            Price::from_units(2999)
        );
        for product in &demo.products {
            assert!(product.validate().is_ok(), "product {}", product.id);
        }
    }

    #[test]
    fn test_demo_orders() {
        let demo = DemoData::load().unwrap();
        let ids: Vec<i32> = demo.orders.iter().map(|o| o.id.as_i32()).collect();
        assert_eq!(ids, (1001..=1007).collect::<Vec<_>>());

        let stats = OrderStats::from_orders(&demo.orders);
        assert_eq!(stats.count(OrderStatus::Pending), 3);
        assert_eq!(stats.count(OrderStatus::Cancelled), 1);
        assert_eq!(stats.total_revenue, Price::from_units(12_361));
    }

    #[test]
    fn test_demo_users_are_hashed() {
        let demo = DemoData::load().unwrap();
        let users = demo.hashed_users().unwrap();
        assert_eq!(users.len(), 5);
        let admin = users.first().unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.role, UserRole::Admin);
        assert!(admin.password_hash.starts_with("$argon2"));
        assert_ne!(admin.password_hash, "admin123");
    }
}
