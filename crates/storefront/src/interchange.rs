//! JSON export and import of whole collections.
//!
//! Exports are pretty-printed arrays. Imports check every record before
//! touching the repository, so a bad file leaves the collection as it was.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::catalog::Product;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::db::{Repository, RepositoryError};
use crate::models::order::Order;
use crate::models::user::User;

/// Errors from importing or exporting a collection.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// Not JSON at all.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("order {index}: {reason}")]
    InvalidOrder { index: usize, reason: String },

    #[error("product {index}: {reason}")]
    InvalidProduct { index: usize, reason: String },

    #[error("user {index}: {reason}")]
    InvalidUser { index: usize, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Snapshot written next to every order save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersBackup {
    pub orders: Vec<Order>,
    pub timestamp: DateTime<Utc>,
    pub count: usize,
}

impl OrdersBackup {
    #[must_use]
    pub fn new(orders: Vec<Order>, timestamp: DateTime<Utc>) -> Self {
        Self {
            count: orders.len(),
            orders,
            timestamp,
        }
    }
}

/// File name for a downloadable backup, e.g.
/// `orders-backup-2025-01-15T10-20-30.json`.
#[must_use]
pub fn backup_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-backup-{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}

// =============================================================================
// Export
// =============================================================================

/// All orders as a pretty JSON array.
///
/// # Errors
///
/// Returns `InterchangeError::Parse` if serialization fails.
pub fn export_orders(orders: &OrderRepository) -> Result<String, InterchangeError> {
    export(&orders.list())
}

/// All products as a pretty JSON array.
///
/// # Errors
///
/// Returns `InterchangeError::Parse` if serialization fails.
pub fn export_products(products: &ProductRepository) -> Result<String, InterchangeError> {
    export(&products.list())
}

/// All users as a pretty JSON array. Passwords appear only as Argon2 hashes.
///
/// # Errors
///
/// Returns `InterchangeError::Parse` if serialization fails.
pub fn export_users(users: &UserRepository) -> Result<String, InterchangeError> {
    export(&users.list())
}

fn export<T: Serialize>(items: &[T]) -> Result<String, InterchangeError> {
    Ok(serde_json::to_string_pretty(items)?)
}

// =============================================================================
// Import
// =============================================================================

/// Parse an orders file without applying it.
///
/// Every entry needs a non-empty `customerName` and an `items` array, and
/// ids must be unique.
///
/// # Errors
///
/// Returns the first problem found.
pub fn parse_orders(json: &str) -> Result<Vec<Order>, InterchangeError> {
    let orders: Vec<Order> = parse_array(json, |index, value| {
        let has_name = value
            .get("customerName")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            return Err(invalid_order(index, "missing customer name"));
        }
        if !value.get("items").is_some_and(Value::is_array) {
            return Err(invalid_order(index, "missing items array"));
        }
        from_value(value, |reason| invalid_order(index, reason))
    })?;

    if let Some(index) = first_duplicate(orders.iter().map(|order| order.id)) {
        return Err(invalid_order(index, "duplicate order id"));
    }
    Ok(orders)
}

/// Replace all orders with the contents of `json`.
///
/// The id high-water mark only ever rises, so ids of orders dropped by the
/// import are not reused.
///
/// # Errors
///
/// Returns the parse or validation error; the repository is untouched then.
pub fn import_orders(repo: &mut OrderRepository, json: &str) -> Result<usize, InterchangeError> {
    let orders = parse_orders(json)?;
    let count = orders.len();
    repo.replace_all(orders)?;
    tracing::info!(count, high_water = %repo.high_water_mark(), "Orders imported");
    Ok(count)
}

/// Parse a products file without applying it.
///
/// # Errors
///
/// Returns the first record that fails to parse or validate.
pub fn parse_products(json: &str) -> Result<Vec<Product>, InterchangeError> {
    let products: Vec<Product> = parse_array(json, |index, value| {
        let product: Product = from_value(value, |reason| invalid_product(index, reason))?;
        product
            .validate()
            .map_err(|e| invalid_product(index, e.to_string()))?;
        Ok(product)
    })?;

    if let Some(index) = first_duplicate(products.iter().map(|product| product.id.clone())) {
        return Err(invalid_product(index, "duplicate product id"));
    }
    Ok(products)
}

/// Replace the catalog with the contents of `json`.
///
/// # Errors
///
/// Returns the parse or validation error; the repository is untouched then.
pub fn import_products(
    repo: &mut ProductRepository,
    json: &str,
) -> Result<usize, InterchangeError> {
    let products = parse_products(json)?;
    let count = products.len();
    repo.replace_all(products)?;
    tracing::info!(count, "Products imported");
    Ok(count)
}

/// Parse a users file without applying it.
///
/// Ids, usernames and emails must all be unique.
///
/// # Errors
///
/// Returns the first record that fails to parse or clashes with an earlier one.
pub fn parse_users(json: &str) -> Result<Vec<User>, InterchangeError> {
    let users: Vec<User> = parse_array(json, |index, value| {
        let user: User = from_value(value, |reason| invalid_user(index, reason))?;
        if user.username.trim().is_empty() {
            return Err(invalid_user(index, "missing username"));
        }
        Ok(user)
    })?;

    if let Some(index) = first_duplicate(users.iter().map(|user| user.id)) {
        return Err(invalid_user(index, "duplicate user id"));
    }
    if let Some(index) = first_duplicate(users.iter().map(|user| user.username.clone())) {
        return Err(invalid_user(index, "username already exists"));
    }
    if let Some(index) = first_duplicate(users.iter().map(|user| user.email.clone())) {
        return Err(invalid_user(index, "email already exists"));
    }
    Ok(users)
}

/// Replace all users with the contents of `json`.
///
/// # Errors
///
/// Returns the parse or validation error; the repository is untouched then.
pub fn import_users(repo: &mut UserRepository, json: &str) -> Result<usize, InterchangeError> {
    let users = parse_users(json)?;
    let count = users.len();
    repo.replace_all(users)?;
    tracing::info!(count, "Users imported");
    Ok(count)
}

fn parse_array<T>(
    json: &str,
    mut convert: impl FnMut(usize, Value) -> Result<T, InterchangeError>,
) -> Result<Vec<T>, InterchangeError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(json)? else {
        return Err(InterchangeError::NotAnArray);
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| convert(index, value))
        .collect()
}

fn from_value<T: DeserializeOwned>(
    value: Value,
    invalid: impl FnOnce(String) -> InterchangeError,
) -> Result<T, InterchangeError> {
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Index of the first element whose key was already seen.
fn first_duplicate<K: Eq + std::hash::Hash>(keys: impl Iterator<Item = K>) -> Option<usize> {
    let mut seen = HashSet::new();
    keys.enumerate()
        .find_map(|(index, key)| (!seen.insert(key)).then_some(index))
}

fn invalid_order(index: usize, reason: impl Into<String>) -> InterchangeError {
    InterchangeError::InvalidOrder {
        index,
        reason: reason.into(),
    }
}

fn invalid_product(index: usize, reason: impl Into<String>) -> InterchangeError {
    InterchangeError::InvalidProduct {
        index,
        reason: reason.into(),
    }
}

fn invalid_user(index: usize, reason: impl Into<String>) -> InterchangeError {
    InterchangeError::InvalidUser {
        index,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use eshop_core::{OrderId, OrderStatus, UserRole};

    use super::*;
    use crate::catalog::product::tests::{plain_product, sized_product};
    use crate::db::users::tests::user;
    use crate::models::order::tests::sample_order;

    fn orders() -> OrderRepository {
        let orders = (1001..=1003)
            .map(|id| sample_order(id, OrderStatus::Pending, 100))
            .collect();
        OrderRepository::from_orders(orders, OrderId::default()).unwrap()
    }

    #[test]
    fn test_backup_file_name() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 20, 30).unwrap();
        assert_eq!(
            backup_file_name("orders", now),
            "orders-backup-2025-01-15T10-20-30.json"
        );
    }

    #[test]
    fn test_backup_counts_orders() {
        let backup = OrdersBackup::new(orders().list(), Utc::now());
        assert_eq!(backup.count, 3);
        let json = serde_json::to_value(&backup).unwrap();
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_orders_export_then_import_into_fresh_repository() {
        let json = export_orders(&orders()).unwrap();
        assert!(json.starts_with('['));

        let mut fresh = OrderRepository::new();
        assert_eq!(import_orders(&mut fresh, &json).unwrap(), 3);
        assert_eq!(fresh.list(), orders().list());
        assert_eq!(fresh.next_id(), OrderId::new(1004));
    }

    #[test]
    fn test_import_rejects_non_array() {
        let mut repo = orders();
        assert!(matches!(
            import_orders(&mut repo, r#"{"orders": []}"#),
            Err(InterchangeError::NotAnArray)
        ));
        assert!(matches!(
            import_orders(&mut repo, "not json"),
            Err(InterchangeError::Parse(_))
        ));
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn test_import_order_requires_name_and_items() {
        let mut repo = orders();
        let mut entries: Vec<Value> =
            serde_json::from_str(&export_orders(&repo).unwrap()).unwrap();

        let second = entries.get_mut(1).unwrap();
        second["customerName"] = Value::String("  ".into());
        let err = import_orders(&mut repo, &Value::Array(entries.clone()).to_string()).unwrap_err();
        assert!(matches!(err, InterchangeError::InvalidOrder { index: 1, .. }));

        let second = entries.get_mut(1).unwrap();
        second["customerName"] = Value::String("Jane".into());
        second.as_object_mut().unwrap().remove("items");
        let err = import_orders(&mut repo, &Value::Array(entries).to_string()).unwrap_err();
        assert_eq!(err.to_string(), "order 1: missing items array");
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn test_import_orders_rejects_duplicate_ids() {
        let doubled = vec![
            sample_order(1001, OrderStatus::Pending, 1),
            sample_order(1001, OrderStatus::Shipped, 2),
        ];
        let json = serde_json::to_string(&doubled).unwrap();
        assert!(matches!(
            parse_orders(&json),
            Err(InterchangeError::InvalidOrder { index: 1, .. })
        ));
    }

    #[test]
    fn test_products_roundtrip_and_validation() {
        let repo =
            ProductRepository::from_products(vec![plain_product("1", 500), sized_product("2")])
                .unwrap();
        let json = export_products(&repo).unwrap();
        let mut fresh = ProductRepository::new();
        assert_eq!(import_products(&mut fresh, &json).unwrap(), 2);
        assert_eq!(fresh.list(), repo.list());

        let mut nameless = plain_product("3", 10);
        nameless.name.en = String::new();
        let json = serde_json::to_string(&vec![nameless]).unwrap();
        assert!(matches!(
            import_products(&mut fresh, &json),
            Err(InterchangeError::InvalidProduct { index: 0, .. })
        ));
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_users_import_checks_uniqueness() {
        let repo = UserRepository::from_users(vec![
            user(1, "admin", UserRole::Admin),
            user(2, "shopper", UserRole::Customer),
        ])
        .unwrap();
        let json = export_users(&repo).unwrap();
        let mut fresh = UserRepository::new();
        assert_eq!(import_users(&mut fresh, &json).unwrap(), 2);

        let mut clash = user(3, "admin", UserRole::Customer);
        clash.email = "other@example.com".parse().unwrap();
        let json = serde_json::to_string(&vec![user(1, "admin", UserRole::Admin), clash]).unwrap();
        let err = import_users(&mut fresh, &json).unwrap_err();
        assert_eq!(err.to_string(), "user 1: username already exists");
    }
}
