//! Product repository with catalog browsing queries.

use eshop_core::{Language, ProductId};

use super::{Entity, MemoryRepository, Repository, RepositoryError};
use crate::catalog::Product;

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Product listing filter, as used by the products page.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery<'a> {
    /// Case-insensitive substring of the name or description.
    pub search: Option<&'a str>,
    /// Exact category; `None` means all.
    pub category: Option<&'a str>,
    /// Language the search text is matched against.
    pub language: Language,
}

/// Repository for catalog products.
#[derive(Debug, Clone, Default)]
pub struct ProductRepository {
    inner: MemoryRepository<Product>,
}

impl ProductRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` on duplicate ids.
    pub fn from_products(products: Vec<Product>) -> Result<Self, RepositoryError> {
        Ok(Self {
            inner: MemoryRepository::from_entities(products)?,
        })
    }

    /// Distinct categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for product in self.inner.list() {
            if !categories.contains(&product.category) {
                categories.push(product.category);
            }
        }
        categories
    }

    /// Products matching `query`, in catalog order.
    #[must_use]
    pub fn search(&self, query: &ProductQuery<'_>) -> Vec<Product> {
        let needle = query.search.map(str::to_lowercase).unwrap_or_default();
        self.inner.filter(|product| {
            let matches_category = query
                .category
                .is_none_or(|category| product.category == category);
            let matches_text = needle.is_empty()
                || product
                    .name
                    .get(query.language)
                    .to_lowercase()
                    .contains(&needle)
                || product
                    .description
                    .get(query.language)
                    .to_lowercase()
                    .contains(&needle);
            matches_category && matches_text
        })
    }

    /// The first `count` products, shown on the home page.
    #[must_use]
    pub fn featured(&self, count: usize) -> Vec<Product> {
        self.inner.list().into_iter().take(count).collect()
    }
}

impl Repository<Product> for ProductRepository {
    fn get(&self, id: &ProductId) -> Option<Product> {
        self.inner.get(id)
    }

    fn list(&self) -> Vec<Product> {
        self.inner.list()
    }

    fn add(&mut self, product: Product) -> Result<Product, RepositoryError> {
        self.inner.add(product)
    }

    fn update(&mut self, product: Product) -> Result<Product, RepositoryError> {
        self.inner.update(product)
    }

    fn delete(&mut self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.inner.delete(id)
    }

    fn replace_all(&mut self, products: Vec<Product>) -> Result<(), RepositoryError> {
        self.inner.replace_all(products)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::product::tests::{plain_product, sized_product};

    fn catalog() -> ProductRepository {
        let mut heater = sized_product("1");
        heater.name.en = "Ceramic Heater".to_owned();
        heater.category = "Heaters".to_owned();

        let mut coil = plain_product("2", 250);
        coil.name.en = "Spare Coil".to_owned();
        coil.category = "Spares".to_owned();

        let mut rod = plain_product("3", 400);
        rod.name.en = "Heating Rod".to_owned();
        rod.category = "Heaters".to_owned();

        ProductRepository::from_products(vec![heater, coil, rod]).unwrap()
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        assert_eq!(catalog().categories(), vec!["Heaters", "Spares"]);
    }

    #[test]
    fn test_search_by_text_and_category() {
        let repo = catalog();

        let heaters = repo.search(&ProductQuery {
            category: Some("Heaters"),
            ..ProductQuery::default()
        });
        assert_eq!(heaters.len(), 2);

        let found = repo.search(&ProductQuery {
            search: Some("COIL"),
            ..ProductQuery::default()
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().unwrap().id, ProductId::from("2"));

        let none = repo.search(&ProductQuery {
            search: Some("coil"),
            category: Some("Heaters"),
            ..ProductQuery::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_featured() {
        assert_eq!(catalog().featured(2).len(), 2);
        assert_eq!(catalog().featured(10).len(), 3);
    }
}
