//! Catalog commands.

use std::path::Path;

use tracing::info;

use eshop_admin::CatalogAdmin;
use eshop_storefront::catalog::price_display_text;
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::db::products::ProductQuery;
use eshop_storefront::services::auth::AuthGate;

use super::CliError;

/// Log the catalog with each product's price or price range.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened.
pub fn list(config: StorefrontConfig) -> Result<(), CliError> {
    let currency = config.currency;
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let products = CatalogAdmin::new(&mut store, &access).list(&ProductQuery::default());

    info!("{} product(s)", products.len());
    for product in &products {
        info!(
            "  [{}] {} ({}) {}",
            product.id,
            product.name.en,
            product.category,
            price_display_text(product, currency)
        );
    }
    Ok(())
}

/// Write the catalog as JSON.
///
/// # Errors
///
/// Returns `CliError::Io` if the output cannot be written.
pub async fn export(config: StorefrontConfig, output: Option<&Path>) -> Result<(), CliError> {
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let json = CatalogAdmin::new(&mut store, &access).export()?;
    super::write_output(output, &json).await
}

/// Replace the catalog from a JSON file.
///
/// # Errors
///
/// Returns `CliError::Admin` if any product is invalid; the catalog is
/// untouched then.
pub async fn import(config: StorefrontConfig, file: &Path) -> Result<(), CliError> {
    let json = super::read_input(file).await?;
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let count = CatalogAdmin::new(&mut store, &access).import(&json)?;
    info!("Imported {count} product(s)");
    Ok(())
}
