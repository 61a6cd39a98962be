//! Crawl engine - page-by-page harvest and catalog merge
//!
//! One `run` call:
//! 1. Loads the stored catalog
//! 2. Fetches listing pages 1, 2, ... until a page fails to download, a page
//!    has no products, or `max_pages` is reached
//! 3. Skips products whose price matches the change cache
//! 4. Refreshes images of new or changed products and merges them
//! 5. Saves the whole catalog once and reports the counts
//!
//! Page fetch failures and empty pages both mean "end of catalog": the
//! listing never says how many pages it has.

use crate::cache::{open_change_cache, ChangeCache};
use crate::catalog::{open_catalog_store, Catalog, CatalogStore, Product};
use crate::config::{Config, FetcherConfig, SiteConfig};
use crate::crawler::extractor::{PageExtractor, ProductCardExtractor, RawRecord};
use crate::crawler::fetcher::AssetFetcher;
use crate::crawler::images::ImageRefresher;
use crate::crawler::price::parse_price_or_zero;
use crate::crawler::state::CrawlState;
use crate::notify::{Notifier, TracingNotifier};
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::Path;

/// Result of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Products added to the catalog
    pub scraped_count: u64,

    /// Products that were already in the catalog and were replaced
    pub updated_count: u64,
}

/// Caller-supplied settings for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunOptions {
    /// Last page to fetch; unbounded when absent
    pub max_pages: Option<NonZeroU32>,

    /// Proxy URL used for every request of the run
    pub proxy: Option<String>,
}

/// Incremental catalog harvester
///
/// The engine owns its collaborators and runs are sequential: `run` takes
/// `&mut self`, so a shared engine must sit behind a lock.
pub struct CrawlEngine {
    site: SiteConfig,
    fetcher_config: FetcherConfig,
    extractor: Box<dyn PageExtractor>,
    cache: Box<dyn ChangeCache>,
    store: Box<dyn CatalogStore>,
    notifier: Box<dyn Notifier>,
}

impl CrawlEngine {
    pub fn new(
        site: SiteConfig,
        fetcher_config: FetcherConfig,
        extractor: Box<dyn PageExtractor>,
        cache: Box<dyn ChangeCache>,
        store: Box<dyn CatalogStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            site,
            fetcher_config,
            extractor,
            cache,
            store,
            notifier,
        }
    }

    /// Builds an engine with the extractor, cache and store named by `config`
    ///
    /// Messages go to the tracing notifier; use `with_notifier` to change that.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let extractor = ProductCardExtractor::new(&config.extractor)?;
        let cache = open_change_cache(&config.cache)?;
        let store = open_catalog_store(&config.catalog)?;

        Ok(Self::new(
            config.site.clone(),
            config.fetcher.clone(),
            Box::new(extractor),
            cache,
            store,
            Box::new(TracingNotifier),
        ))
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Runs one harvest
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The catalog was saved
    /// * `Err(HarvestError)` - The catalog could not be loaded or saved, or
    ///   the HTTP client could not be built. Nothing is saved in that case.
    pub async fn run(&mut self, options: RunOptions) -> Result<CrawlSummary, HarvestError> {
        let Self {
            site,
            fetcher_config,
            extractor,
            cache,
            store,
            notifier,
        } = self;
        let notifier: &dyn Notifier = &**notifier;

        let catalog = Catalog::from_products(store.load()?);
        tracing::info!("Loaded catalog with {} products", catalog.len());

        let fetcher = AssetFetcher::new(fetcher_config, options.proxy.as_deref())?;
        let images = ImageRefresher::new(&fetcher, notifier, Path::new(&site.image_dir));
        let mut run = RunState::new(catalog);

        let mut page = 1u32;
        loop {
            run.advance(CrawlState::FetchingPage(page));
            let page_url = site.page_url_for(page);
            tracing::info!("Fetching page {}: {}", page, page_url);

            let body = match fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(e) => {
                    notifier.notify(&format!("Failed to retrieve page {}: {}", page, e));
                    run.advance(CrawlState::Finished);
                    break;
                }
            };

            run.advance(CrawlState::ExtractingRecords(page));
            let mut records = extractor.extract(&body, &page_url).peekable();
            if records.peek().is_none() {
                notifier.notify(&format!(
                    "No products found on page {}. Stopping harvest.",
                    page
                ));
                run.advance(CrawlState::Finished);
                break;
            }

            for (index, record) in records.enumerate() {
                run.advance(CrawlState::ProcessingRecord { page, index });
                process_record(record, &mut **cache, &images, &mut run).await;
            }
            run.advance(CrawlState::PageDone(page));

            tracing::info!(
                "Page {} done: {} skipped unchanged, totals scraped {} updated {}",
                page,
                run.skipped_on_page,
                run.summary.scraped_count,
                run.summary.updated_count
            );
            run.skipped_on_page = 0;

            let reached_limit = options.max_pages.is_some_and(|max| page >= max.get());
            match page.checked_add(1) {
                Some(next) if !reached_limit => page = next,
                _ => {
                    run.advance(CrawlState::Finished);
                    break;
                }
            }
        }

        let RunState {
            catalog, summary, ..
        } = run;

        if let Err(e) = store.save(catalog.as_slice()) {
            tracing::error!("Failed to save catalog: {}", e);
            return Err(e.into());
        }

        notifier.notify(&format!(
            "Harvest completed. Scraped: {}, Updated: {}",
            summary.scraped_count, summary.updated_count
        ));
        Ok(summary)
    }
}

/// Handles one extracted record: change check, image refresh, merge
async fn process_record(
    record: RawRecord,
    cache: &mut dyn ChangeCache,
    images: &ImageRefresher<'_>,
    run: &mut RunState,
) {
    // The title is the catalog key; a stored empty title would fail every later load
    if record.title.trim().is_empty() {
        tracing::warn!(
            "Skipping record without a title (price text '{}')",
            record.price_text
        );
        return;
    }

    let price = parse_price_or_zero(&record.price_text);

    match cache.get(&record.title) {
        Ok(Some(cached)) if cached == price => {
            tracing::debug!("Price of {} unchanged at {}, skipping", record.title, price);
            run.skipped_on_page += 1;
            return;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(
                "Change cache lookup failed for {}: {}; treating as changed",
                record.title,
                e
            );
        }
    }

    // Written before the image fetch: a crash before the catalog save can
    // leave the cache ahead of the catalog.
    if let Err(e) = cache.set(&record.title, price) {
        tracing::warn!("Failed to record price of {} in change cache: {}", record.title, e);
    }

    let image_path = images.refresh(&record.image_url, &record.title).await;
    run.merge(Product::new(record.title, price, image_path));
}

/// Mutable state owned by a single run
struct RunState {
    state: CrawlState,
    catalog: Catalog,
    /// Titles already counted this run
    counted: HashSet<String>,
    summary: CrawlSummary,
    skipped_on_page: usize,
}

impl RunState {
    fn new(catalog: Catalog) -> Self {
        Self {
            state: CrawlState::Start,
            catalog,
            counted: HashSet::new(),
            summary: CrawlSummary::default(),
            skipped_on_page: 0,
        }
    }

    fn advance(&mut self, next: CrawlState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid crawl transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
    }

    /// Inserts or replaces `product`, counting each title at most once
    ///
    /// A title seen again in the same run replaces the earlier value (last
    /// wins) but stays in the bucket it was first counted in.
    fn merge(&mut self, product: Product) {
        let title = product.title().to_string();

        if self.counted.contains(&title) {
            tracing::debug!("{} seen again this run, replacing", title);
        } else if self.catalog.contains(&title) {
            tracing::debug!("Updated {} (price {})", title, product.price());
            self.summary.updated_count += 1;
        } else {
            tracing::debug!("New product {} (price {})", title, product.price());
            self.summary.scraped_count += 1;
        }

        self.catalog.upsert(product);
        self.counted.insert(title);
    }
}
