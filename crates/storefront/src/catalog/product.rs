//! Product domain types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eshop_core::{Language, LocalizedList, LocalizedText, Price, ProductId};

/// A per-size price and stock override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    /// Size label, matched case-sensitively (e.g. "12 inch").
    pub size: String,
    /// Selling price for this size.
    pub price: Price,
    /// List price for this size, shown struck through when higher.
    pub original_price: Price,
    /// Whether this size can currently be shipped.
    pub in_stock: bool,
}

/// A catalog product.
///
/// When `size_options` is non-empty it is authoritative for price and stock;
/// `price`, `original_price` and `in_stock` are only the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product id.
    pub id: ProductId,
    /// Display name in every language.
    pub name: LocalizedText,
    /// Long description in every language.
    pub description: LocalizedText,
    /// Base selling price.
    pub price: Price,
    /// Base list price.
    pub original_price: Price,
    /// Category label used for browsing.
    pub category: String,
    /// Image paths, first one is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    /// Legacy size labels, used only when `size_options` is empty.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Per-size pricing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub size_options: Vec<SizeOption>,
    /// Base stock flag; absent means in stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    /// Feature bullets in every language.
    #[serde(default)]
    pub features: LocalizedList,
}

/// Reasons a product record cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductValidationError {
    #[error("product name is required")]
    MissingName,
    #[error("product description is required")]
    MissingDescription,
    #[error("product price is required")]
    MissingPrice,
    #[error("product category is required")]
    MissingCategory,
    #[error("size {0:?} is listed more than once")]
    DuplicateSize(String),
}

impl Product {
    /// Name in the requested language.
    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        self.name.get(language)
    }

    /// Primary image path, or an empty string when the product has none.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    /// Whether per-size pricing applies.
    #[must_use]
    pub fn has_size_options(&self) -> bool {
        !self.size_options.is_empty()
    }

    /// Base stock flag with the "absent means in stock" default applied.
    #[must_use]
    pub fn base_in_stock(&self) -> bool {
        self.in_stock.unwrap_or(true)
    }

    /// Check the fields the admin form requires.
    ///
    /// # Errors
    ///
    /// Returns the first missing or inconsistent field.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.is_blank() {
            return Err(ProductValidationError::MissingName);
        }
        if self.description.is_blank() {
            return Err(ProductValidationError::MissingDescription);
        }
        if self.price.is_zero() {
            return Err(ProductValidationError::MissingPrice);
        }
        if self.category.trim().is_empty() {
            return Err(ProductValidationError::MissingCategory);
        }

        let mut seen = std::collections::HashSet::new();
        for option in &self.size_options {
            if !seen.insert(option.size.as_str()) {
                return Err(ProductValidationError::DuplicateSize(option.size.clone()));
            }
        }

        Ok(())
    }

    /// Drop blank image, size and feature entries left over from form input.
    #[must_use]
    pub fn without_blank_entries(mut self) -> Self {
        self.images.retain(|image| !image.trim().is_empty());
        self.sizes.retain(|size| !size.trim().is_empty());
        self.features = self.features.without_blanks();
        self
    }
}
