//! In-process change cache
//!
//! Lives only as long as the process. Clones share the same entries, which
//! lets a caller keep a handle on the cache it gave to an engine.

use crate::cache::traits::{CacheResult, ChangeCache};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryChangeCache {
    entries: Arc<Mutex<HashMap<String, f64>>>,
}

impl MemoryChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of titles with a recorded price
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, f64>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ChangeCache for MemoryChangeCache {
    fn get(&mut self, title: &str) -> CacheResult<Option<f64>> {
        Ok(self.lock().get(title).copied())
    }

    fn set(&mut self, title: &str, price: f64) -> CacheResult<()> {
        self.lock().insert(title.to_string(), price);
        Ok(())
    }
}
