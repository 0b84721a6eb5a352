//! Pure cart state transitions.
//!
//! [`reduce`] never mutates its input and never performs I/O. `total` and
//! `item_count` are recomputed from the full line list after every action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eshop_core::{Price, ProductId};

use crate::catalog::{PricingError, Product, resolve_price, resolve_price_strict};

/// How `Add` treats a size the product does not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePolicy {
    /// Charge the base price for unknown sizes.
    Lenient,
    /// Reject unknown sizes on products with size options.
    #[default]
    Strict,
}

impl std::str::FromStr for SizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("invalid size policy: {s}")),
        }
    }
}

/// Errors from cart transitions. The state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {product_id} is not sold in size {size:?}")]
    UnknownSize { product_id: ProductId, size: String },
}

impl From<PricingError> for CartError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::UnknownSize { product_id, size } => {
                Self::UnknownSize { product_id, size }
            }
        }
    }
}

/// One (product, size) pairing with its locked-in price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product snapshot taken when the line was created.
    pub product: Product,
    /// Always at least 1 while the line is in the cart.
    pub quantity: u32,
    pub selected_size: String,
    /// Price resolved when the line was created; never re-resolved.
    pub selected_price: Price,
}

impl CartLine {
    /// Whether this line has the identity `(product_id, size)`.
    #[must_use]
    pub fn is(&self, product_id: &ProductId, size: &str) -> bool {
        self.product.id == *product_id && self.selected_size == size
    }

    /// `selected_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.selected_price.times(self.quantity)
    }
}

/// Ordered cart lines plus their derived aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    lines: Vec<CartLine>,
    total: Price,
    item_count: u32,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from lines, dropping zero-quantity lines.
    #[must_use]
    pub fn from_lines(mut lines: Vec<CartLine>) -> Self {
        lines.retain(|line| line.quantity > 0);
        let total = lines.iter().map(CartLine::line_total).sum();
        let item_count = lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity));
        Self {
            lines,
            total,
            item_count,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of `selected_price × quantity` over all lines.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line with identity `(product_id, size)`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, size: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.is(product_id, size))
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }
}

impl<'de> Deserialize<'de> for CartState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            lines: Vec<CartLine>,
        }

        // Aggregates are always rebuilt from the lines.
        Raw::deserialize(deserializer).map(|raw| Self::from_lines(raw.lines))
    }
}

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of `product` in `size`.
    Add { product: Product, size: String },
    /// Drop the line for `(product_id, size)`; no-op when absent.
    Remove { product_id: ProductId, size: String },
    /// Replace the quantity, clamped at zero; zero removes the line.
    UpdateQuantity {
        product_id: ProductId,
        size: String,
        quantity: i64,
    },
    /// Empty the cart.
    Clear,
}

impl CartAction {
    /// Short action name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::UpdateQuantity { .. } => "update_quantity",
            Self::Clear => "clear",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
///
/// # Errors
///
/// Returns [`CartError::UnknownSize`] when `policy` is [`SizePolicy::Strict`]
/// and an `Add` names a size the product does not offer.
pub fn reduce(
    state: &CartState,
    action: CartAction,
    policy: SizePolicy,
) -> Result<CartState, CartError> {
    let mut lines = state.lines.clone();

    match action {
        CartAction::Add { product, size } => {
            if let Some(line) = lines.iter_mut().find(|line| line.is(&product.id, &size)) {
                line.quantity = line.quantity.saturating_add(1);
            } else {
                let resolved = match policy {
                    SizePolicy::Lenient => resolve_price(&product, &size),
                    SizePolicy::Strict => resolve_price_strict(&product, &size)?,
                };
                lines.push(CartLine {
                    product,
                    quantity: 1,
                    selected_size: size,
                    selected_price: resolved.price,
                });
            }
        }
        CartAction::Remove { product_id, size } => {
            lines.retain(|line| !line.is(&product_id, &size));
        }
        CartAction::UpdateQuantity {
            product_id,
            size,
            quantity,
        } => {
            let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
            if let Some(line) = lines.iter_mut().find(|line| line.is(&product_id, &size)) {
                line.quantity = quantity;
            }
        }
        CartAction::Clear => lines.clear(),
    }

    Ok(CartState::from_lines(lines))
}
