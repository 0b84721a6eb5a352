//! Product management panel.

use chrono::{DateTime, Utc};

use eshop_core::ProductId;
use eshop_storefront::Storefront;
use eshop_storefront::catalog::Product;
use eshop_storefront::db::{Repository, RepositoryError};
use eshop_storefront::db::products::ProductQuery;
use eshop_storefront::interchange;
use eshop_storefront::services::auth::AdminAccess;

use crate::error::{AdminError, Result};

/// Catalog CRUD for admins.
pub struct CatalogAdmin<'a> {
    store: &'a mut Storefront,
    access: &'a AdminAccess,
}

impl<'a> CatalogAdmin<'a> {
    #[must_use]
    pub const fn new(store: &'a mut Storefront, access: &'a AdminAccess) -> Self {
        Self { store, access }
    }

    /// Products matching the panel's search box and category filter.
    #[must_use]
    pub fn list(&self, query: &ProductQuery<'_>) -> Vec<Product> {
        self.store.products().search(query)
    }

    /// Add a product from the form.
    ///
    /// Blank image, size and feature rows are dropped. A blank id is replaced
    /// with the current time in milliseconds, bumped until unused.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Product` when required fields are missing and
    /// `AdminError::Repository` if the id is already taken.
    pub fn create(&mut self, product: Product, now: DateTime<Utc>) -> Result<Product> {
        let mut product = product.without_blank_entries();
        if product.id.as_str().trim().is_empty() {
            product.id = self.fresh_id(now);
        }
        product.validate()?;

        let product = self.store.products_mut(self.access).add(product)?;
        self.store.persist_products();
        tracing::info!(
            actor = self.access.actor().name(),
            product_id = %product.id,
            "Product added"
        );
        Ok(product)
    }

    /// Replace an existing product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Product` for invalid input and
    /// `AdminError::NotFound` for unknown ids.
    pub fn update(&mut self, product: Product) -> Result<Product> {
        let product = product.without_blank_entries();
        product.validate()?;

        let id = product.id.clone();
        let product = self
            .store
            .products_mut(self.access)
            .update(product)
            .map_err(|e| not_found_or(e, &id))?;
        self.store.persist_products();
        tracing::info!(
            actor = self.access.actor().name(),
            product_id = %product.id,
            "Product updated"
        );
        Ok(product)
    }

    /// Remove a product. Orders keep their own copy of the line items.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for unknown ids.
    pub fn delete(&mut self, id: &ProductId) -> Result<Product> {
        let product = self
            .store
            .products_mut(self.access)
            .delete(id)
            .map_err(|e| not_found_or(e, id))?;
        self.store.persist_products();
        tracing::info!(
            actor = self.access.actor().name(),
            product_id = %id,
            "Product deleted"
        );
        Ok(product)
    }

    /// The whole catalog as a pretty JSON array.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import` if serialization fails.
    pub fn export(&self) -> Result<String> {
        Ok(interchange::export_products(self.store.products())?)
    }

    /// Replace the catalog with the contents of `json`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import`; the catalog is unchanged on error.
    pub fn import(&mut self, json: &str) -> Result<usize> {
        let count = interchange::import_products(self.store.products_mut(self.access), json)?;
        self.store.persist_products();
        tracing::info!(actor = self.access.actor().name(), count, "Catalog replaced from import");
        Ok(count)
    }

    fn fresh_id(&self, now: DateTime<Utc>) -> ProductId {
        let mut millis = now.timestamp_millis();
        loop {
            let id = ProductId::new(millis.to_string());
            if self.store.product(&id).is_none() {
                return id;
            }
            millis = millis.saturating_add(1);
        }
    }
}

fn not_found_or(err: RepositoryError, id: &ProductId) -> AdminError {
    match err {
        RepositoryError::NotFound => AdminError::NotFound(format!("product {id}")),
        other => other.into(),
    }
}
