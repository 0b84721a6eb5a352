//! Order domain types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use eshop_core::{OrderId, OrderStatus, Price, ProductId, UserId};

/// A purchased line, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product the line was bought from.
    pub id: ProductId,
    /// English product name at purchase time.
    pub name: String,
    /// Unit price charged.
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// `0` for guest checkouts.
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    /// Subtotal plus tax plus shipping.
    pub total_amount: Price,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub status: OrderStatus,
    pub order_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Order {
    /// Total number of units across all items.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }
}

/// Aggregate figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    /// Sum of `total_amount` over orders that are not cancelled.
    pub total_revenue: Price,
    pub status_counts: BTreeMap<String, usize>,
}

impl OrderStats {
    /// Compute stats over `orders`.
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut status_counts: BTreeMap<String, usize> = OrderStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_owned(), 0))
            .collect();
        for order in orders {
            *status_counts
                .entry(order.status.as_str().to_owned())
                .or_default() += 1;
        }

        Self {
            total_orders: orders.len(),
            total_revenue: orders
                .iter()
                .filter(|order| order.status != OrderStatus::Cancelled)
                .map(|order| order.total_amount)
                .sum(),
            status_counts,
        }
    }

    /// Number of orders currently in `status`.
    #[must_use]
    pub fn count(&self, status: OrderStatus) -> usize {
        self.status_counts.get(status.as_str()).copied().unwrap_or(0)
    }
}
