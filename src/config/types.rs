use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// The catalog being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Listing page URL with a `{page}` placeholder for the 1-based page number
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Directory downloaded product images are written to
    #[serde(rename = "image-dir", default = "default_image_dir")]
    pub image_dir: String,
}

impl SiteConfig {
    /// Builds the URL of listing page `page`
    pub fn page_url_for(&self, page: u32) -> String {
        self.page_url.replace("{page}", &page.to_string())
    }
}

/// HTTP behaviour of the asset fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Per-attempt timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per fetch, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before the first retry (milliseconds)
    #[serde(rename = "initial-backoff-ms", default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Multiplier applied to the wait after every retry
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: u32,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            user_agent: default_user_agent(),
        }
    }
}

/// CSS selectors used to pull product records out of a listing page
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// One match per product card
    #[serde(default = "default_product_selector")]
    pub product: String,

    /// Title element within a card
    #[serde(default = "default_title_selector")]
    pub title: String,

    /// Price element within a card
    #[serde(default = "default_price_selector")]
    pub price: String,

    /// Image element within a card
    #[serde(default = "default_image_selector")]
    pub image: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            product: default_product_selector(),
            title: default_title_selector(),
            price: default_price_selector(),
            image: default_image_selector(),
        }
    }
}

/// Where the catalog is persisted
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub backend: CatalogBackend,

    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::default(),
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    #[default]
    Json,
    Sqlite,
}

/// Where last-seen prices are kept between runs
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Redis host
    #[serde(default = "default_cache_host")]
    pub host: String,

    /// Redis port
    #[serde(default = "default_cache_port")]
    pub port: u16,

    /// SQLite database file
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            host: default_cache_host(),
            port: default_cache_port(),
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP endpoint binds to (host:port)
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_factor() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("catalog-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_product_selector() -> String {
    "div.product-inner".to_string()
}

fn default_title_selector() -> String {
    "h2.woo-loop-product__title".to_string()
}

fn default_price_selector() -> String {
    "span.woocommerce-Price-amount".to_string()
}

fn default_image_selector() -> String {
    "img".to_string()
}

fn default_catalog_path() -> String {
    "products.json".to_string()
}

fn default_cache_host() -> String {
    "localhost".to_string()
}

fn default_cache_port() -> u16 {
    6379
}

fn default_cache_path() -> String {
    "change-cache.db".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
