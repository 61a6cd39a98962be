//! JSON file catalog store
//!
//! The document is an array of product objects, pretty-printed with
//! four-space indentation and non-ASCII text kept literal.

use crate::catalog::traits::{CatalogStore, StoreResult};
use crate::catalog::Product;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};

/// Catalog persisted as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the catalog is written to before being renamed into place
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> StoreResult<Vec<Product>> {
        if !self.path.exists() {
            tracing::debug!("No catalog at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let products: Vec<Product> = serde_json::from_str(&content)?;
        for product in &products {
            product.validate()?;
        }

        tracing::debug!(
            "Loaded {} products from {}",
            products.len(),
            self.path.display()
        );
        Ok(products)
    }

    fn save(&mut self, products: &[Product]) -> StoreResult<()> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        products.serialize(&mut serializer)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, &buffer)?;
        std::fs::rename(&temp, &self.path)?;

        tracing::debug!("Saved {} products to {}", products.len(), self.path.display());
        Ok(())
    }
}
