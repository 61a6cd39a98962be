use crate::config::types::{
    CacheBackend, CacheConfig, CatalogConfig, Config, ExtractorConfig, FetcherConfig, SiteConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_extractor_config(&config.extractor)?;
    validate_catalog_config(&config.catalog)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates the harvested site
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if !config.page_url.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "page-url must contain a {{page}} placeholder, got '{}'",
            config.page_url
        )));
    }

    let first_page = config.page_url_for(1);
    let url = Url::parse(&first_page)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid page-url '{}': {}", first_page, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "page-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.image_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "image-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher timeouts and retry policy
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_factor < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be >= 1, got {}",
            config.backoff_factor
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector parses
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("product", &config.product),
        ("title", &config.title),
        ("price", &config.price),
        ("image", &config.image),
    ] {
        validate_selector(name, selector)?;
    }
    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!(
            "extractor.{} is not a valid CSS selector '{}': {:?}",
            name, selector, e
        ))
    })
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    match config.backend {
        CacheBackend::Redis => {
            if config.host.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "cache host cannot be empty".to_string(),
                ));
            }
            if config.port == 0 {
                return Err(ConfigError::Validation(
                    "cache port must be non-zero".to_string(),
                ));
            }
        }
        CacheBackend::Sqlite => {
            if config.path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "cache path cannot be empty".to_string(),
                ));
            }
        }
        CacheBackend::Memory => {}
    }
    Ok(())
}
