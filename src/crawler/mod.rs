//! Crawler module for listing harvests
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - Product card extraction and price normalisation
//! - Image refresh
//! - The page-by-page crawl engine

mod engine;
mod extractor;
mod fetcher;
mod images;
mod price;
mod state;

pub use engine::{CrawlEngine, CrawlSummary, RunOptions};
pub use extractor::{PageExtractor, ProductCardExtractor, RawRecord, Records};
pub use fetcher::{build_http_client, AssetFetcher};
pub use images::{image_file_path, ImageRefresher};
pub use price::{parse_price, parse_price_or_zero};
pub use state::CrawlState;

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest with the backends named by `config`
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `options` - Page limit and proxy for this run
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Harvest completed and the catalog was saved
/// * `Err(HarvestError)` - A backend could not be opened or the catalog could
///   not be loaded or saved
pub async fn harvest(config: &Config, options: RunOptions) -> Result<CrawlSummary, HarvestError> {
    CrawlEngine::from_config(config)?.run(options).await
}
