//! Product catalog and the pricing resolver.
//!
//! Products are read-only for shoppers; only the admin catalog service
//! creates, edits or deletes them.

pub mod pricing;
pub mod product;

pub use pricing::{
    PriceRange, PricingError, ResolvedPrice, available_sizes, default_size, discount_percentage,
    has_variable_pricing, is_size_in_stock, price_display_text, price_range, resolve_price,
    resolve_price_strict,
};
pub use product::{Product, ProductValidationError, SizeOption};
