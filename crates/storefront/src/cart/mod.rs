//! Shopping cart.
//!
//! [`reducer`] holds the pure state machine. [`Cart`] wraps a [`CartState`]
//! with the configured [`SizePolicy`] and logs each transition.

pub mod reducer;

pub use reducer::{CartAction, CartError, CartLine, CartState, SizePolicy, reduce};

use eshop_core::{CurrencyCode, Language, Price, ProductId};

use crate::catalog::Product;
use crate::company::ShippingSettings;
use crate::error::add_breadcrumb;

/// A shopper's cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    state: CartState,
    policy: SizePolicy,
}

impl Cart {
    /// An empty cart using `policy` for unknown sizes.
    #[must_use]
    pub fn new(policy: SizePolicy) -> Self {
        Self {
            state: CartState::new(),
            policy,
        }
    }

    /// Resume a cart from a saved state.
    #[must_use]
    pub const fn with_state(state: CartState, policy: SizePolicy) -> Self {
        Self { state, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> SizePolicy {
        self.policy
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Owned copy of the current state, for checkout.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.state.total()
    }

    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.state.item_count()
    }

    /// Apply an action. On error the cart is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] when the reducer rejects the action.
    pub fn dispatch(&mut self, action: CartAction) -> Result<&CartState, CartError> {
        let name = action.name();
        match reduce(&self.state, action, self.policy) {
            Ok(next) => {
                self.state = next;
                tracing::debug!(
                    action = name,
                    item_count = self.state.item_count(),
                    total = %self.state.total(),
                    "Cart updated"
                );
                Ok(&self.state)
            }
            Err(err) => {
                tracing::debug!(action = name, error = %err, "Cart action rejected");
                Err(err)
            }
        }
    }

    /// Add one unit of `product` in `size`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownSize`] under the strict policy when the
    /// product is not sold in `size`.
    pub fn add(&mut self, product: &Product, size: &str) -> Result<&CartState, CartError> {
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product.id.as_str()), ("size", size)]),
        );
        self.dispatch(CartAction::Add {
            product: product.clone(),
            size: size.to_owned(),
        })
    }

    /// Drop the line for `(product_id, size)`.
    pub fn remove(&mut self, product_id: &ProductId, size: &str) -> &CartState {
        self.apply_infallible(CartAction::Remove {
            product_id: product_id.clone(),
            size: size.to_owned(),
        })
    }

    /// Set the quantity of a line; zero or negative removes it.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        size: &str,
        quantity: i64,
    ) -> &CartState {
        self.apply_infallible(CartAction::UpdateQuantity {
            product_id: product_id.clone(),
            size: size.to_owned(),
            quantity,
        })
    }

    pub fn clear(&mut self) -> &CartState {
        self.apply_infallible(CartAction::Clear)
    }

    /// Amount still needed for free shipping, if any.
    #[must_use]
    pub fn free_shipping_shortfall(&self, shipping: &ShippingSettings) -> Option<Price> {
        shipping.shortfall(self.state.total())
    }

    fn apply_infallible(&mut self, action: CartAction) -> &CartState {
        // Only `Add` can fail.
        if let Ok(next) = reduce(&self.state, action, self.policy) {
            self.state = next;
        }
        tracing::debug!(
            item_count = self.state.item_count(),
            total = %self.state.total(),
            "Cart updated"
        );
        &self.state
    }
}

// =============================================================================
// Display
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    /// "Add ₹X more for free shipping" amount, already formatted.
    pub free_shipping_shortfall: Option<String>,
}

impl CartView {
    /// Render `cart` in `language` and `currency`.
    #[must_use]
    pub fn new(
        cart: &Cart,
        shipping: &ShippingSettings,
        language: Language,
        currency: CurrencyCode,
    ) -> Self {
        let state = cart.state();
        Self {
            items: state
                .lines()
                .iter()
                .map(|line| CartItemView::new(line, language, currency))
                .collect(),
            subtotal: state.total().display(currency),
            item_count: state.item_count(),
            free_shipping_shortfall: cart
                .free_shipping_shortfall(shipping)
                .map(|amount| amount.display(currency)),
        }
    }
}

impl CartItemView {
    fn new(line: &CartLine, language: Language, currency: CurrencyCode) -> Self {
        Self {
            product_id: line.product.id.to_string(),
            name: line.product.display_name(language).to_owned(),
            size: (!line.selected_size.is_empty()).then(|| line.selected_size.clone()),
            quantity: line.quantity,
            price: line.selected_price.display(currency),
            line_price: line.line_total().display(currency),
            image: line.product.primary_image().to_owned(),
        }
    }
}
