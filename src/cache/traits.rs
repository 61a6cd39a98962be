//! Change cache trait and error types

use thiserror::Error;

/// Errors raised by a change cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cached price for '{key}' is not a number: '{value}'")]
    Corrupt { key: String, value: String },
}

/// Result type for change cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Durable title → last-seen price map
///
/// A cold cache (no entry) reads as `None`. Entries never expire on the
/// harvester's side; a backend may apply its own expiry.
pub trait ChangeCache: Send {
    /// Returns the last price recorded for `title`
    fn get(&mut self, title: &str) -> CacheResult<Option<f64>>;

    /// Records `price` as the last price seen for `title`
    fn set(&mut self, title: &str, price: f64) -> CacheResult<()>;
}
