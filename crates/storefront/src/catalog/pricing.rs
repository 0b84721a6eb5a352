//! Pricing resolver: maps a product and a selected size to the price the
//! shopper pays.
//!
//! Size matching is exact and case-sensitive. [`resolve_price`] falls back to
//! the base price when the size is unknown; [`resolve_price_strict`] refuses
//! instead. The cart picks one of the two through its size policy.

use std::collections::BTreeSet;

use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use eshop_core::{CurrencyCode, Price, ProductId};

use super::product::{Product, SizeOption};

/// Price and stock for one product/size combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub price: Price,
    pub original_price: Price,
    pub in_stock: bool,
}

/// Errors from strict price resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The product has size options and none matches the requested size.
    #[error("product {product_id} has no size {size:?}")]
    UnknownSize { product_id: ProductId, size: String },
}

/// Lowest and highest prices across a product's sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
    pub min_original: Price,
    pub max_original: Price,
}

fn matching_option<'a>(product: &'a Product, size: &str) -> Option<&'a SizeOption> {
    product.size_options.iter().find(|option| option.size == size)
}

fn base_price(product: &Product) -> ResolvedPrice {
    ResolvedPrice {
        price: product.price,
        original_price: product.original_price,
        in_stock: product.base_in_stock(),
    }
}

impl From<&SizeOption> for ResolvedPrice {
    fn from(option: &SizeOption) -> Self {
        Self {
            price: option.price,
            original_price: option.original_price,
            in_stock: option.in_stock,
        }
    }
}

/// Resolve the price for `size`, silently falling back to the base price.
#[must_use]
pub fn resolve_price(product: &Product, size: &str) -> ResolvedPrice {
    matching_option(product, size).map_or_else(|| base_price(product), ResolvedPrice::from)
}

/// Resolve the price for `size`, rejecting sizes the product does not offer.
///
/// Products without size options accept any size at the base price.
///
/// # Errors
///
/// Returns [`PricingError::UnknownSize`] when the product has size options
/// and none of them is `size`.
pub fn resolve_price_strict(product: &Product, size: &str) -> Result<ResolvedPrice, PricingError> {
    if !product.has_size_options() {
        return Ok(base_price(product));
    }

    matching_option(product, size)
        .map(ResolvedPrice::from)
        .ok_or_else(|| PricingError::UnknownSize {
            product_id: product.id.clone(),
            size: size.to_owned(),
        })
}

/// The sizes a shopper can pick from.
///
/// Products without size options expose their legacy `sizes` list, each
/// entry priced at the base price.
#[must_use]
pub fn available_sizes(product: &Product) -> Vec<SizeOption> {
    if product.has_size_options() {
        return product.size_options.clone();
    }

    product
        .sizes
        .iter()
        .map(|size| SizeOption {
            size: size.clone(),
            price: product.price,
            original_price: product.original_price,
            in_stock: product.base_in_stock(),
        })
        .collect()
}

/// The size preselected on the product page: the first in-stock size, else
/// the first size, else an empty string.
#[must_use]
pub fn default_size(product: &Product) -> String {
    let sizes = available_sizes(product);
    sizes
        .iter()
        .find(|option| option.in_stock)
        .or_else(|| sizes.first())
        .map(|option| option.size.clone())
        .unwrap_or_default()
}

/// Whether `size` is in stock (unknown sizes report the base stock flag).
#[must_use]
pub fn is_size_in_stock(product: &Product, size: &str) -> bool {
    resolve_price(product, size).in_stock
}

/// Whole-number discount off the list price for `size`.
///
/// Returns 0 unless the list price is positive and above the selling price.
#[must_use]
pub fn discount_percentage(product: &Product, size: &str) -> u32 {
    let ResolvedPrice {
        price,
        original_price,
        ..
    } = resolve_price(product, size);

    let original = original_price.amount();
    if original.is_sign_negative() || original.is_zero() || original_price <= price {
        return 0;
    }

    ((original - price.amount()) * rust_decimal::Decimal::ONE_HUNDRED / original)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Price range over the available sizes, `None` when there are no sizes.
#[must_use]
pub fn price_range(product: &Product) -> Option<PriceRange> {
    let sizes = available_sizes(product);
    let prices = sizes.iter().map(|option| option.price);
    let originals = sizes.iter().map(|option| option.original_price);

    Some(PriceRange {
        min: prices.clone().min()?,
        max: prices.max()?,
        min_original: originals.clone().min()?,
        max_original: originals.max()?,
    })
}

/// Whether at least two size options carry different prices.
#[must_use]
pub fn has_variable_pricing(product: &Product) -> bool {
    if product.size_options.len() <= 1 {
        return false;
    }

    let distinct: BTreeSet<Price> = product.size_options.iter().map(|o| o.price).collect();
    distinct.len() > 1
}

/// Listing label: a single price, or `"min - max"` for variable pricing.
#[must_use]
pub fn price_display_text(product: &Product, currency: CurrencyCode) -> String {
    if !has_variable_pricing(product) {
        return product.price.display(currency);
    }

    match price_range(product) {
        Some(range) if range.min != range.max => format!(
            "{} - {}",
            range.min.display(currency),
            range.max.display(currency)
        ),
        Some(range) => range.min.display(currency),
        None => product.price.display(currency),
    }
}
