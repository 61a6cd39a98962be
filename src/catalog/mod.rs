//! Catalog module: the product entity, the in-memory catalog, and its stores
//!
//! - `Product`: immutable value keyed by title
//! - `Catalog`: insertion-ordered title → product map owned by one run
//! - `CatalogStore`: full-catalog load/save contract with JSON and SQLite backends

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonCatalogStore;
pub use sqlite::SqliteCatalogStore;
pub use traits::{CatalogStore, StoreError, StoreResult};

use crate::config::{CatalogBackend, CatalogConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A harvested product
///
/// The title is the catalog identity. A changed product is a new value that
/// replaces the old one under the same title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_title")]
    title: String,

    /// 0.0 doubles as the "unparsable price" sentinel
    #[serde(rename = "product_price")]
    price: f64,

    /// Empty when no image is stored
    #[serde(rename = "path_to_image")]
    image_path: String,
}

impl Product {
    pub fn new(title: impl Into<String>, price: f64, image_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price,
            image_path: image_path.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Returns true when an image file is recorded for this product
    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }

    /// Checks the entity invariants: non-empty title, non-negative finite price
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "product title cannot be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(StoreError::InvalidRecord(format!(
                "product '{}' has invalid price {}",
                self.title, self.price
            )));
        }
        Ok(())
    }
}

/// Title → product map that preserves insertion order
///
/// Replacing a product keeps its original position, so the saved catalog is
/// stable across runs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a loaded product sequence
    ///
    /// A repeated title keeps the first position and the last value.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::new();
        for product in products {
            catalog.upsert(product);
        }
        catalog
    }

    pub fn get(&self, title: &str) -> Option<&Product> {
        self.index.get(title).map(|&i| &self.products[i])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    /// Inserts or replaces the product under its title
    ///
    /// Returns the replaced product, if any.
    pub fn upsert(&mut self, product: Product) -> Option<Product> {
        match self.index.get(product.title()) {
            Some(&i) => Some(std::mem::replace(&mut self.products[i], product)),
            None => {
                self.index
                    .insert(product.title().to_string(), self.products.len());
                self.products.push(product);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Products in insertion order
    pub fn as_slice(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }
}

/// Opens the catalog store selected by the configuration
pub fn open_catalog_store(config: &CatalogConfig) -> StoreResult<Box<dyn CatalogStore>> {
    let path = Path::new(&config.path);
    let store: Box<dyn CatalogStore> = match config.backend {
        CatalogBackend::Json => Box::new(JsonCatalogStore::new(path)),
        CatalogBackend::Sqlite => Box::new(SqliteCatalogStore::new(path)?),
    };
    Ok(store)
}
