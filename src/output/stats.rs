//! Statistics generation from the stored catalog
//!
//! This module provides functionality for summarising a catalog and
//! displaying the result.

use crate::catalog::{CatalogStore, Product, StoreResult};

/// Catalog statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStatistics {
    /// Number of products in the catalog
    pub total_products: u64,

    /// Products carrying the 0.0 "unparsable price" sentinel
    pub unpriced_products: u64,

    /// Products without a stored image
    pub products_without_image: u64,

    /// Lowest non-zero price, if any
    pub min_price: Option<f64>,

    /// Highest price, if any product is priced
    pub max_price: Option<f64>,
}

impl CatalogStatistics {
    /// Computes statistics over `products`
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut stats = Self::default();

        for product in products {
            stats.total_products += 1;

            if !product.has_image() {
                stats.products_without_image += 1;
            }

            let price = product.price();
            if price == 0.0 {
                stats.unpriced_products += 1;
                continue;
            }

            stats.min_price = Some(stats.min_price.map_or(price, |min| min.min(price)));
            stats.max_price = Some(stats.max_price.map_or(price, |max| max.max(price)));
        }

        stats
    }
}

/// Loads statistics from a catalog store
///
/// # Arguments
///
/// * `store` - The store to read the catalog from
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully computed statistics
/// * `Err(StoreError)` - The catalog could not be loaded
pub fn load_statistics(store: &dyn CatalogStore) -> StoreResult<CatalogStatistics> {
    let products = store.load()?;
    Ok(CatalogStatistics::from_products(&products))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total products: {}", stats.total_products);
    println!(
        "  Without price (0.0): {} ({:.1}%)",
        stats.unpriced_products,
        percentage(stats.unpriced_products, stats.total_products)
    );
    println!(
        "  Without image: {} ({:.1}%)",
        stats.products_without_image,
        percentage(stats.products_without_image, stats.total_products)
    );
    println!();

    match (stats.min_price, stats.max_price) {
        (Some(min), Some(max)) => {
            println!("Prices:");
            println!("  Lowest: {:.2}", min);
            println!("  Highest: {:.2}", max);
        }
        _ => println!("No priced products"),
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
