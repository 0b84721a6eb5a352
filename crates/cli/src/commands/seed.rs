//! Seed a data directory with the demo store.
//!
//! The demo catalog can be swapped for a YAML list of products:
//!
//! ```yaml
//! - id: "21"
//!   name: { en: Cartridge Heater }
//!   description: { en: High watt density cartridge }
//!   price: 450
//!   originalPrice: 520
//!   category: CARTRIDGE
//! ```

use std::path::Path;

use tracing::info;

use eshop_storefront::catalog::Product;
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::db::Repository;
use eshop_storefront::demo::DemoData;
use eshop_storefront::error::AppError;
use eshop_storefront::services::auth::AuthGate;

use super::CliError;

/// Seed the store, refusing to overwrite data unless `force` is set.
///
/// # Errors
///
/// Returns `CliError::NotEmpty` when data exists and `force` is false, and
/// `CliError::InvalidCatalog` for a bad catalog entry.
pub async fn run(
    config: StorefrontConfig,
    catalog: Option<&Path>,
    force: bool,
) -> Result<(), CliError> {
    let mut data = DemoData::load().map_err(AppError::from)?;
    if let Some(path) = catalog {
        data.products = load_catalog(path).await?;
        info!(products = data.products.len(), "Parsed catalog");
    }

    let mut store = super::open(config)?;
    if !store.is_empty() {
        if !force {
            return Err(CliError::NotEmpty);
        }
        tracing::warn!("Overwriting existing data");
    }

    store.seed(&AuthGate::operator(), data)?;

    info!("Seeding complete!");
    info!("  Products: {}", store.products().len());
    info!("  Users: {}", store.users().len());
    info!("  Orders: {}", store.orders().len());
    Ok(())
}

async fn load_catalog(path: &Path) -> Result<Vec<Product>, CliError> {
    let content = super::read_input(path).await?;
    parse_catalog(&content)
}

fn parse_catalog(yaml: &str) -> Result<Vec<Product>, CliError> {
    let products: Vec<Product> = serde_yaml::from_str(yaml)?;
    products
        .into_iter()
        .enumerate()
        .map(|(index, product)| {
            let product = product.without_blank_entries();
            product
                .validate()
                .map_err(|e| CliError::InvalidCatalog {
                    index,
                    reason: e.to_string(),
                })?;
            Ok(product)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_core::{Price, ProductId};
    use eshop_storefront::Storefront;

    use super::*;
    use crate::commands::tests::temp_config;

    const CATALOG: &str = r#"
- id: "21"
  name: { en: Cartridge Heater }
  description: { en: High watt density cartridge }
  price: 450
  originalPrice: 520
  category: CARTRIDGE
  images: [cartridge.webp, ""]
- id: "22"
  name: { en: Band Heater }
  description: { en: Ceramic band heater }
  price: 700
  originalPrice: 800
  category: BAND
  sizeOptions:
    - { size: 2 inch, price: 700, originalPrice: 800, inStock: true }
"#;

    #[test]
    fn test_parse_catalog() {
        let products = parse_catalog(CATALOG).unwrap();
        assert_eq!(products.len(), 2);
        let first = products.first().unwrap();
        assert_eq!(first.id, ProductId::from("21"));
        assert_eq!(first.images, vec!["cartridge.webp".to_owned()]);
        assert_eq!(first.price, Price::from_units(450));
    }

    #[test]
    fn test_parse_catalog_rejects_invalid_entries() {
        let yaml = CATALOG.replace("category: BAND", "category: \" \"");
        assert!(matches!(
            parse_catalog(&yaml),
            Err(CliError::InvalidCatalog { index: 1, .. })
        ));
        assert!(matches!(parse_catalog("id: 1"), Err(CliError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_seed_refuses_to_overwrite_without_force() {
        let (dir, config) = temp_config();
        run(config.clone(), None, false).await.unwrap();
        assert!(matches!(
            run(config.clone(), None, false).await,
            Err(CliError::NotEmpty)
        ));

        let path = dir.path().join("catalog.yaml");
        tokio::fs::write(&path, CATALOG).await.unwrap();
        run(config.clone(), Some(&path), true).await.unwrap();

        let store = Storefront::open(config).unwrap();
        assert_eq!(store.products().len(), 2);
        assert_eq!(store.orders().len(), 7);
    }
}
