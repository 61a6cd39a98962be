//! Catalog-Harvest: an incremental product catalog harvester
//!
//! This crate walks a paginated product listing, detects products that are new
//! or whose price changed since the last run, refreshes their images and
//! persists the merged catalog.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod notify;
pub mod output;
pub mod server;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
///
/// Only failures that abort a run surface as `HarvestError`. Everything that
/// happens once pagination has started is recovered inside the engine, except
/// the final catalog save.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog store error: {0}")]
    Store(#[from] catalog::StoreError),

    #[error("Change cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// A failed download of a page or an image
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl NetworkError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }

    /// Returns true for server-side (5xx) and connection-level failures
    ///
    /// Client errors (4xx) and anything else are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => (500..600).contains(status),
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
        }
    }
}

/// Price text that does not hold a non-negative number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unparsable price text: '{text}'")]
pub struct ParseError {
    pub text: String,
}

/// A derived image filename that cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid or empty image filename")]
    EmptyFilename,

    #[error("Image URL has no file extension: {0}")]
    MissingExtension(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogStore, Product};
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlSummary, RunOptions};
pub use notify::Notifier;
