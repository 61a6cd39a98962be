//! Output module for catalog reports
//!
//! This module handles computing and printing statistics over the stored
//! catalog (`--stats` mode).

pub mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};
