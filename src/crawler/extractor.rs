//! Page extraction: listing HTML to raw product records
//!
//! The engine only sees the `PageExtractor` trait. `ProductCardExtractor`
//! is the CSS-selector implementation for product-card listings
//! (WooCommerce markup by default).

use crate::config::ExtractorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Image attributes checked in order; lazy-loading themes keep the real URL
/// in a data attribute and a placeholder in `src`
const IMAGE_ATTRIBUTES: [&str; 3] = ["data-lazy-src", "data-src", "src"];

/// One product as it appears on a listing page, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub title: String,
    pub price_text: String,
    /// Absolute URL, or empty when the card has no image
    pub image_url: String,
}

/// Records of one page, in page order
pub type Records<'a> = Box<dyn Iterator<Item = RawRecord> + Send + 'a>;

/// Turns the raw content of one listing page into product records
///
/// An empty sequence means the catalog has no more content.
pub trait PageExtractor: Send + Sync {
    /// # Arguments
    ///
    /// * `page` - The page body as fetched
    /// * `page_url` - The URL the page was fetched from, for resolving relative links
    fn extract<'a>(&'a self, page: &'a [u8], page_url: &'a str) -> Records<'a>;
}

/// Selector-driven extractor for product-card listings
#[derive(Debug, Clone)]
pub struct ProductCardExtractor {
    product: Selector,
    title: Selector,
    price: Selector,
    image: Selector,
    noscript: Selector,
    noscript_image: Selector,
    fragment_image: Selector,
}

impl ProductCardExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            product: parse_selector("product", &config.product)?,
            title: parse_selector("title", &config.title)?,
            price: parse_selector("price", &config.price)?,
            image: parse_selector("image", &config.image)?,
            noscript: parse_selector("noscript", "noscript")?,
            noscript_image: parse_selector("noscript image", "noscript img")?,
            fragment_image: parse_selector("image", "img")?,
        })
    }

    fn record_from_card(&self, card: ElementRef<'_>, base: Option<&Url>) -> Option<RawRecord> {
        let title = card
            .select(&self.title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if title.is_empty() {
            tracing::debug!("Skipping product card without a title");
            return None;
        }

        let price_text = card
            .select(&self.price)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();

        let image_url = self
            .image_source(card)
            .map(|src| resolve_url(&src, base))
            .unwrap_or_default();

        Some(RawRecord {
            title,
            price_text,
            image_url,
        })
    }

    /// Finds the image URL of a card
    ///
    /// The `<noscript>` fallback is preferred because it carries the real
    /// URL on lazy-loading themes. Depending on how the document was parsed
    /// its content is either elements or raw text.
    fn image_source(&self, card: ElementRef<'_>) -> Option<String> {
        if let Some(src) = card.select(&self.noscript_image).find_map(image_attribute) {
            return Some(src);
        }

        for noscript in card.select(&self.noscript) {
            let fragment = Html::parse_fragment(&noscript.text().collect::<String>());
            if let Some(src) = fragment.select(&self.fragment_image).find_map(image_attribute) {
                return Some(src);
            }
        }

        card.select(&self.image).find_map(image_attribute)
    }
}

impl PageExtractor for ProductCardExtractor {
    fn extract<'a>(&'a self, page: &'a [u8], page_url: &'a str) -> Records<'a> {
        let html = String::from_utf8_lossy(page);
        let document = Html::parse_document(&html);
        let base = Url::parse(page_url).ok();

        // The parsed document is not Send, so records are collected before
        // they are handed to the engine.
        let records: Vec<RawRecord> = document
            .select(&self.product)
            .filter_map(|card| self.record_from_card(card, base.as_ref()))
            .collect();

        tracing::debug!("Extracted {} product records from {}", records.len(), page_url);
        Box::new(records.into_iter())
    }
}

fn parse_selector(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid {} selector '{}': {:?}",
            name, selector, e
        ))
    })
}

fn image_attribute(element: ElementRef<'_>) -> Option<String> {
    IMAGE_ATTRIBUTES.iter().find_map(|attr| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.starts_with("data:"))
            .map(str::to_string)
    })
}

fn resolve_url(src: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(src).ok()) {
        Some(url) => url.to_string(),
        None => src.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
