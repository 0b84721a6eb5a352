//! Checkout: totals and the order recorder.
//!
//! Payment is a client-side confirmation only. [`PaymentConfirmation`] records
//! that the shopper said they paid, nothing more.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eshop_core::{CurrencyCode, OrderStatus, Price, UserId};

use crate::cart::{CartLine, CartState};
use crate::company::{ShippingSettings, TaxSettings};
use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::models::order::{Order, OrderItem, ShippingAddress};
use crate::models::user::PublicUser;

/// Days between order date and the estimated delivery date.
pub const DELIVERY_LEAD_DAYS: u64 = 7;

/// Note attached to every storefront order.
pub const WEB_CHECKOUT_NOTE: &str = "Order placed via web checkout";

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    #[error("shipping address is missing {0}")]
    IncompleteAddress(&'static str),

    #[error("could not record order: {0}")]
    Repository(#[from] RepositoryError),
}

/// Money breakdown shown on the checkout page and stored as the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

impl CheckoutTotals {
    /// Totals for `cart` under the given settings.
    ///
    /// Free shipping is judged on the subtotal before tax.
    #[must_use]
    pub fn compute(cart: &CartState, tax: &TaxSettings, shipping: &ShippingSettings) -> Self {
        let subtotal = cart.total();
        let tax = tax.tax_on(subtotal);
        let shipping = shipping.charge_for(subtotal);
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    /// One display line per component, for receipts and logs.
    #[must_use]
    pub fn summary(&self, currency: CurrencyCode) -> String {
        format!(
            "subtotal {} + tax {} + shipping {} = {}",
            self.subtotal.display(currency),
            self.tax.display(currency),
            self.shipping.display(currency),
            self.total.display(currency)
        )
    }
}

/// How the shopper says they paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentConfirmation {
    /// The client confirmed payment (UPI, card, cash on delivery...). Nothing
    /// is verified.
    TrustedClient { method: String },
}

impl PaymentConfirmation {
    /// Client-confirmed payment using `method`.
    #[must_use]
    pub fn trusted(method: impl Into<String>) -> Self {
        Self::TrustedClient {
            method: method.into(),
        }
    }

    /// Method name stored on the order.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::TrustedClient { method } => method,
        }
    }
}

/// Customer identity copied onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

impl CustomerInfo {
    /// Checkout without an account.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            user_id: UserId::new(0),
            name: "Guest User".to_owned(),
            email: "guest@email.com".to_owned(),
        }
    }
}

impl From<&PublicUser> for CustomerInfo {
    fn from(user: &PublicUser) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}

impl ShippingAddress {
    /// Check the fields the checkout form requires.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IncompleteAddress` naming the first blank field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        for (field, value) in [
            ("full name", &self.full_name),
            ("address", &self.address),
            ("city", &self.city),
            ("postal code", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::IncompleteAddress(field));
            }
        }
        Ok(())
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.product.id.clone(),
            name: line.product.name.en.clone(),
            price: line.selected_price,
            quantity: line.quantity,
            image: line.product.primary_image().to_owned(),
            category: line.product.category.clone(),
        }
    }
}

/// Turns a cart snapshot into a stored order.
pub struct OrderRecorder<'a> {
    orders: &'a mut OrderRepository,
    tax: TaxSettings,
    shipping: ShippingSettings,
}

impl<'a> OrderRecorder<'a> {
    #[must_use]
    pub const fn new(
        orders: &'a mut OrderRepository,
        tax: TaxSettings,
        shipping: ShippingSettings,
    ) -> Self {
        Self {
            orders,
            tax,
            shipping,
        }
    }

    /// Record a pending order for `cart`.
    ///
    /// Clearing the cart is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart (no order is
    /// created) and `CheckoutError::IncompleteAddress` for a blank address
    /// field.
    pub fn place_order(
        &mut self,
        cart: &CartState,
        customer: &CustomerInfo,
        address: &ShippingAddress,
        payment: &PaymentConfirmation,
        today: NaiveDate,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        address.validate()?;

        let totals = CheckoutTotals::compute(cart, &self.tax, &self.shipping);
        let order = Order {
            id: self.orders.next_id(),
            user_id: customer.user_id,
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            items: cart.lines().iter().map(OrderItem::from).collect(),
            total_amount: totals.total,
            shipping_address: address.clone(),
            payment_method: payment.method().to_owned(),
            status: OrderStatus::Pending,
            order_date: today,
            estimated_delivery: today.checked_add_days(Days::new(DELIVERY_LEAD_DAYS)),
            tracking_number: None,
            notes: Some(WEB_CHECKOUT_NOTE.to_owned()),
        };

        let order = self.orders.insert_new(order)?;
        tracing::info!(
            order_id = %order.id,
            customer = %order.customer_name,
            items = order.items.len(),
            total = %order.total_amount,
            "Order placed"
        );
        Ok(order)
    }
}
