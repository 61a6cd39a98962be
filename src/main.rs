//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product
//! catalog harvester.

use anyhow::{bail, Context};
use catalog_harvest::catalog::open_catalog_store;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::{CrawlEngine, RunOptions};
use catalog_harvest::notify::ConsoleNotifier;
use catalog_harvest::output::{load_statistics, print_statistics};
use catalog_harvest::server;
use clap::Parser;
use std::num::NonZeroU32;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: an incremental product catalog harvester
///
/// Walks a paginated product listing, picks up new products and price
/// changes, refreshes their images and saves the merged catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "An incremental product catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Stop after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<NonZeroU32>,

    /// Proxy URL used for every request
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "serve"])]
    dry_run: bool,

    /// Show statistics of the stored catalog and exit
    #[arg(long, conflicts_with_all = ["dry_run", "serve"])]
    stats: bool,

    /// Serve the HTTP trigger endpoint instead of running once
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "max_pages", "proxy"])]
    serve: bool,

    /// Address to bind the HTTP endpoint to (overrides [server] bind)
    #[arg(long, requires = "serve")]
    bind: Option<String>,

    /// API token required in the api-key-header header
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.max_pages);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.serve {
        handle_serve(&config, cli.bind, cli.auth_token).await?;
    } else {
        let options = RunOptions {
            max_pages: cli.max_pages,
            proxy: cli.proxy,
        };
        handle_harvest(&config, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config, max_pages: Option<NonZeroU32>) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Page URL: {}", config.site.page_url);
    println!("  First page: {}", config.site.page_url_for(1));
    println!("  Image directory: {}", config.site.image_dir);

    println!("\nFetcher:");
    println!("  Timeout: {}ms", config.fetcher.timeout_ms);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!(
        "  Backoff: {}ms x{}",
        config.fetcher.initial_backoff_ms, config.fetcher.backoff_factor
    );
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nSelectors:");
    println!("  Product: {}", config.extractor.product);
    println!("  Title: {}", config.extractor.title);
    println!("  Price: {}", config.extractor.price);
    println!("  Image: {}", config.extractor.image);

    println!("\nCatalog: {:?} at {}", config.catalog.backend, config.catalog.path);
    println!(
        "Change cache: {:?} ({}:{}, {})",
        config.cache.backend, config.cache.host, config.cache.port, config.cache.path
    );

    println!("\n✓ Configuration is valid");
    match max_pages {
        Some(n) => println!("✓ Would harvest up to {} pages", n),
        None => println!("✓ Would harvest until an empty or unreachable page"),
    }
}

/// Handles the --stats mode: shows statistics of the stored catalog
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Catalog: {}\n", config.catalog.path);

    let store = open_catalog_store(&config.catalog)?;
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --serve mode: runs the HTTP trigger endpoint
async fn handle_serve(
    config: &Config,
    bind: Option<String>,
    auth_token: Option<String>,
) -> anyhow::Result<()> {
    let Some(auth_token) = auth_token.filter(|t| !t.is_empty()) else {
        bail!("--serve needs an API token (--auth-token or AUTH_TOKEN)");
    };

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let engine = CrawlEngine::from_config(config)?;
    server::serve(&bind, engine, auth_token)
        .await
        .with_context(|| format!("server on {} stopped", bind))
}

/// Handles a single harvest run
async fn handle_harvest(config: &Config, options: RunOptions) -> anyhow::Result<()> {
    if let Some(max) = options.max_pages {
        tracing::info!("Starting harvest (at most {} pages)", max);
    } else {
        tracing::info!("Starting harvest");
    }
    if options.proxy.is_some() {
        tracing::info!("Routing requests through proxy");
    }

    let mut engine = CrawlEngine::from_config(config)?.with_notifier(Box::new(ConsoleNotifier));

    match engine.run(options).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed successfully (scraped {}, updated {})",
                summary.scraped_count,
                summary.updated_count
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
