//! Catalog store trait and error types

use crate::catalog::Product;
use thiserror::Error;

/// Errors that can occur while loading or saving a catalog
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid catalog record: {0}")]
    InvalidRecord(String),
}

/// Result type for catalog store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Full-catalog persistence
///
/// A store always reads and writes the whole catalog; there are no
/// per-product operations.
pub trait CatalogStore: Send {
    /// Loads every product in stored order
    ///
    /// A missing backing resource is an empty catalog, not an error.
    fn load(&self) -> StoreResult<Vec<Product>>;

    /// Replaces the stored catalog with `products`, atomically
    fn save(&mut self, products: &[Product]) -> StoreResult<()>;
}
