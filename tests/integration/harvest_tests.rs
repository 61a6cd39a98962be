//! Integration tests for the harvester
//!
//! These tests use wiremock to serve listing pages and product images and
//! run complete harvests end-to-end against on-disk catalogs.

use catalog_harvest::config::{
    CacheBackend, CacheConfig, CatalogBackend, CatalogConfig, Config, ExtractorConfig,
    FetcherConfig, ServerConfig, SiteConfig,
};
use catalog_harvest::crawler::{harvest, CrawlEngine, CrawlSummary, RunOptions};
use catalog_harvest::output::load_statistics;
use catalog_harvest::{catalog::open_catalog_store, HarvestError, Notifier, Product};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration harvesting from `server_uri` into `dir`
fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            page_url: format!("{}/shop/page/{{page}}/", server_uri),
            image_dir: dir.join("images").to_string_lossy().into_owned(),
        },
        fetcher: FetcherConfig {
            timeout_ms: 2_000,
            max_attempts: 2,
            initial_backoff_ms: 10, // Very short for testing
            backoff_factor: 2,
            user_agent: "TestHarvester/1.0".to_string(),
        },
        extractor: ExtractorConfig::default(),
        catalog: CatalogConfig {
            backend: CatalogBackend::Json,
            path: dir.join("products.json").to_string_lossy().into_owned(),
        },
        cache: CacheConfig {
            backend: CacheBackend::Sqlite,
            host: "localhost".to_string(),
            port: 6379,
            path: dir.join("change-cache.db").to_string_lossy().into_owned(),
        },
        server: ServerConfig::default(),
    }
}

/// Renders one WooCommerce product card
fn product_card(title: &str, price: &str, image_url: Option<&str>) -> String {
    let image = image_url
        .map(|url| {
            format!(
                r#"<div class="mf-product-thumbnail"><img src="data:image/svg+xml;base64,AA" data-lazy-src="{url}"><noscript><img src="{url}"></noscript></div>"#,
                url = url
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="product-inner">{}
            <div class="mf-product-details">
                <h2 class="woo-loop-product__title"><a href="/product/x">{}</a></h2>
                <span class="price"><span class="woocommerce-Price-amount amount"><bdi><span class="woocommerce-Price-currencySymbol">₹</span>{}</bdi></span></span>
            </div>
        </div>"#,
        image, title, price
    )
}

fn listing_page(cards: &[String]) -> String {
    format!(
        r#"<html><head><title>Shop</title></head><body><ul class="products">{}</ul></body></html>"#,
        cards.concat()
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/shop/page/{}/", page)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/uploads/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89u8, 0x50, 0x4E, 0x47]))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn load_catalog(config: &Config) -> Vec<Product> {
    open_catalog_store(&config.catalog).unwrap().load().unwrap()
}

#[derive(Clone, Default)]
struct RecordingNotifier(Arc<Mutex<Vec<String>>>);

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test]
async fn test_new_product_then_price_change_across_runs() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let image_url = format!("{}/uploads/widget.jpg", mock_server.uri());

    // First run: Widget at 100
    mount_page(
        &mock_server,
        1,
        listing_page(&[product_card("Widget", "100.00", Some(&image_url))]),
    )
    .await;
    mount_page(&mock_server, 2, listing_page(&[])).await;
    mount_image(&mock_server, "widget.jpg", 1).await;

    let first = harvest(&config, RunOptions::default()).await.unwrap();
    assert_eq!(
        first,
        CrawlSummary {
            scraped_count: 1,
            updated_count: 0
        }
    );

    let image_path = Path::new(&config.site.image_dir).join("Widget.jpg");
    assert_eq!(
        load_catalog(&config),
        vec![Product::new("Widget", 100.0, image_path.to_string_lossy())]
    );
    assert_eq!(std::fs::read(&image_path).unwrap(), vec![0x89u8, 0x50, 0x4E, 0x47]);

    // Second run, fresh engine: Widget now at 150
    mock_server.reset().await;
    mount_page(
        &mock_server,
        1,
        listing_page(&[product_card("Widget", "150.00", Some(&image_url))]),
    )
    .await;
    mount_page(&mock_server, 2, listing_page(&[])).await;
    mount_image(&mock_server, "widget.jpg", 1).await;

    let second = harvest(&config, RunOptions::default()).await.unwrap();
    assert_eq!(
        second,
        CrawlSummary {
            scraped_count: 0,
            updated_count: 1
        }
    );

    let catalog = load_catalog(&config);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].price(), 150.0);
}

#[tokio::test]
async fn test_repeated_run_is_idempotent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let image_url = format!("{}/uploads/mirror.png", mock_server.uri());

    mount_page(
        &mock_server,
        1,
        listing_page(&[
            product_card("Dental Mirror", "1,250.00", Some(&image_url)),
            product_card("Cotton Rolls", "99.00", None),
        ]),
    )
    .await;
    mount_page(
        &mock_server,
        2,
        listing_page(&[product_card("Scaler", "Out of stock", None)]),
    )
    .await;
    mount_page(&mock_server, 3, listing_page(&[])).await;
    // Unchanged prices must not refetch images
    mount_image(&mock_server, "mirror.png", 1).await;

    let mut engine = CrawlEngine::from_config(&config).unwrap();

    let first = engine.run(RunOptions::default()).await.unwrap();
    assert_eq!(first.scraped_count, 3);
    let after_first = std::fs::read_to_string(&config.catalog.path).unwrap();

    let second = engine.run(RunOptions::default()).await.unwrap();
    let after_second = std::fs::read_to_string(&config.catalog.path).unwrap();

    assert_eq!(second, CrawlSummary::default());
    assert_eq!(after_first, after_second);

    let titles: Vec<_> = load_catalog(&config)
        .iter()
        .map(|p| p.title().to_string())
        .collect();
    assert_eq!(titles, vec!["Dental Mirror", "Cotton Rolls", "Scaler"]);
}

#[tokio::test]
async fn test_empty_page_stops_pagination() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_page(&mock_server, 1, listing_page(&[product_card("A", "1", None)])).await;
    mount_page(&mock_server, 2, listing_page(&[product_card("B", "2", None)])).await;
    mount_page(&mock_server, 3, "<html><body>No products were found</body></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/shop/page/4/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[product_card(
            "D", "4", None,
        )])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let notifier = RecordingNotifier::default();
    let summary = CrawlEngine::from_config(&config)
        .unwrap()
        .with_notifier(Box::new(notifier.clone()))
        .run(RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.scraped_count, 2);
    assert_eq!(load_catalog(&config).len(), 2);
    assert_eq!(
        notifier.messages(),
        vec![
            "No products found on page 3. Stopping harvest.".to_string(),
            "Harvest completed. Scraped: 2, Updated: 0".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_max_pages_bounds_pages_fetched() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    for page in 1..=2 {
        mount_page(
            &mock_server,
            page,
            listing_page(&[product_card(&format!("Item {}", page), "10", None)]),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/shop/page/3/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let options = RunOptions {
        max_pages: NonZeroU32::new(2),
        proxy: None,
    };
    let summary = harvest(&config, options).await.unwrap();

    assert_eq!(summary.scraped_count, 2);
}

#[tokio::test]
async fn test_malformed_price_is_stored_as_zero() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_page(
        &mock_server,
        1,
        listing_page(&[product_card("Impression Tray", "Call us", None)]),
    )
    .await;
    mount_page(&mock_server, 2, listing_page(&[])).await;

    let summary = harvest(&config, RunOptions::default()).await.unwrap();

    assert_eq!(summary.scraped_count, 1);
    assert_eq!(
        load_catalog(&config),
        vec![Product::new("Impression Tray", 0.0, "")]
    );

    let stats = load_statistics(open_catalog_store(&config.catalog).unwrap().as_ref()).unwrap();
    assert_eq!(stats.unpriced_products, 1);
    assert_eq!(stats.products_without_image, 1);
}

#[tokio::test]
async fn test_page_failure_stops_pagination_and_keeps_results() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_page(&mock_server, 1, listing_page(&[product_card("A", "5", None)])).await;
    Mock::given(method("GET"))
        .and(path("/shop/page/2/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2) // max-attempts
        .mount(&mock_server)
        .await;

    let notifier = RecordingNotifier::default();
    let summary = CrawlEngine::from_config(&config)
        .unwrap()
        .with_notifier(Box::new(notifier.clone()))
        .run(RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.scraped_count, 1);
    assert_eq!(load_catalog(&config), vec![Product::new("A", 5.0, "")]);

    let messages = notifier.messages();
    assert!(messages[0].starts_with("Failed to retrieve page 2"));
    assert_eq!(messages[1], "Harvest completed. Scraped: 1, Updated: 0");
}

#[tokio::test]
async fn test_pages_and_images_go_through_proxy() {
    // The site host does not resolve; only the proxy can answer
    let proxy = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://catalog.invalid", dir.path());
    let image_url = "http://catalog.invalid/uploads/widget.jpg";

    Mock::given(method("GET"))
        .and(path("/shop/page/1/"))
        .and(header("host", "catalog.invalid"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[product_card(
            "Widget",
            "100.00",
            Some(image_url),
        )])))
        .expect(1)
        .mount(&proxy)
        .await;
    Mock::given(method("GET"))
        .and(path("/shop/page/2/"))
        .and(header("host", "catalog.invalid"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(1)
        .mount(&proxy)
        .await;
    mount_image(&proxy, "widget.jpg", 1).await;

    let options = RunOptions {
        max_pages: None,
        proxy: Some(proxy.uri()),
    };
    let summary = harvest(&config, options).await.unwrap();

    assert_eq!(summary.scraped_count, 1);
    let image_path = Path::new(&config.site.image_dir).join("Widget.jpg");
    assert_eq!(std::fs::read(&image_path).unwrap(), vec![0x89u8, 0x50, 0x4E, 0x47]);
    assert_eq!(
        load_catalog(&config),
        vec![Product::new("Widget", 100.0, image_path.to_string_lossy())]
    );
}

#[tokio::test]
async fn test_image_failure_keeps_product_without_image() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let image_url = format!("{}/uploads/missing.jpg", mock_server.uri());

    mount_page(
        &mock_server,
        1,
        listing_page(&[product_card("Forceps", "45.50", Some(&image_url))]),
    )
    .await;
    mount_page(&mock_server, 2, listing_page(&[])).await;
    Mock::given(method("GET"))
        .and(path("/uploads/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = RecordingNotifier::default();
    let summary = CrawlEngine::from_config(&config)
        .unwrap()
        .with_notifier(Box::new(notifier.clone()))
        .run(RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.scraped_count, 1);
    assert_eq!(load_catalog(&config), vec![Product::new("Forceps", 45.5, "")]);
    assert!(notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Failed to download image for Forceps")));
}

#[tokio::test]
async fn test_save_failure_is_reported() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());

    // The catalog's parent directory is a regular file
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    config.catalog.path = blocker.join("products.json").to_string_lossy().into_owned();

    mount_page(&mock_server, 1, listing_page(&[product_card("A", "5", None)])).await;
    mount_page(&mock_server, 2, listing_page(&[])).await;

    let notifier = RecordingNotifier::default();
    let result = CrawlEngine::from_config(&config)
        .unwrap()
        .with_notifier(Box::new(notifier.clone()))
        .run(RunOptions::default())
        .await;

    assert!(matches!(result, Err(HarvestError::Store(_))));
    assert!(!notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Harvest completed")));
}

#[tokio::test]
async fn test_sqlite_catalog_backend() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.catalog = CatalogConfig {
        backend: CatalogBackend::Sqlite,
        path: dir.path().join("catalog.db").to_string_lossy().into_owned(),
    };
    config.cache.backend = CacheBackend::Memory;

    mount_page(
        &mock_server,
        1,
        listing_page(&[product_card("B", "2", None), product_card("A", "1", None)]),
    )
    .await;
    mount_page(&mock_server, 2, listing_page(&[])).await;

    let summary = harvest(&config, RunOptions::default()).await.unwrap();

    assert_eq!(summary.scraped_count, 2);
    assert_eq!(
        load_catalog(&config),
        vec![Product::new("B", 2.0, ""), Product::new("A", 1.0, "")]
    );
}
