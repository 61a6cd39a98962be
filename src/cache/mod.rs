//! Change cache module
//!
//! Remembers the last price seen for every product title so unchanged
//! products can be skipped on later runs. Backends:
//! - Redis, addressed by host and port
//! - SQLite, a local file
//! - memory, for one-process use and tests

mod memory;
mod redis_cache;
mod sqlite;
mod traits;

pub use memory::MemoryChangeCache;
pub use redis_cache::RedisChangeCache;
pub use sqlite::SqliteChangeCache;
pub use traits::{CacheError, CacheResult, ChangeCache};

use crate::config::{CacheBackend, CacheConfig};
use std::path::Path;

/// Opens the change cache selected by the configuration
pub fn open_change_cache(config: &CacheConfig) -> CacheResult<Box<dyn ChangeCache>> {
    let cache: Box<dyn ChangeCache> = match config.backend {
        CacheBackend::Redis => Box::new(RedisChangeCache::connect(&config.host, config.port)?),
        CacheBackend::Sqlite => Box::new(SqliteChangeCache::new(Path::new(&config.path))?),
        CacheBackend::Memory => Box::new(MemoryChangeCache::new()),
    };
    Ok(cache)
}
