//! TTL Store Module
//!
//! Process-wide memoization store: a mutex-guarded HashMap with per-entry
//! expiry, lazy eviction on read and prefix invalidation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{AccelError, Result};

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl StoreInner {
    fn sync_len(&mut self) {
        let len = self.entries.len();
        self.stats.set_total_entries(len);
    }
}

// == TTL Store ==
/// Concurrency-safe key/value map with per-entry expiry.
///
/// Every operation runs under one mutex covering the whole map. Nothing
/// awaits while the guard is held, so `get`/`set`/`delete` hold it for O(1)
/// amortized time and `invalidate_by_prefix`/`clear` for O(n).
#[derive(Debug)]
pub struct TtlStore {
    inner: Mutex<StoreInner>,
    /// TTL applied when a caller does not provide one
    default_ttl: Duration,
}

impl TtlStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - Lifetime for entries stored without an explicit TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| AccelError::LockPoisoned("cache store"))
    }

    // == Get ==
    /// Returns the value stored under `key` if present and unexpired.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let now = Instant::now();

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                let ttl_remaining_ms = entry.ttl_remaining_at(now).as_millis() as u64;
                inner.stats.record_hit();
                debug!(key, ttl_remaining_ms, "cache hit");
                return Ok(Some(value));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.remove(key);
            inner.stats.record_expirations(1);
            inner.sync_len();
            debug!(key, "cache entry expired");
        }

        inner.stats.record_miss();
        Ok(None)
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any prior entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Lifetime for this entry (uses the default TTL if None)
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));

        let mut inner = self.lock()?;
        debug!(key = %key, ttl_ms = entry.ttl.as_millis() as u64, "cache set");
        inner.entries.insert(key, entry);
        inner.sync_len();
        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.stats.record_invalidations(1);
            inner.sync_len();
            debug!(key, "cache delete");
        }
        Ok(removed)
    }

    // == Invalidate By Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Runs in a single critical section, so no concurrent reader observes a
    /// partially invalidated namespace.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> Result<usize> {
        let mut inner = self.lock()?;
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - inner.entries.len();

        inner.stats.record_invalidations(removed);
        inner.sync_len();
        debug!(prefix, removed, "cache invalidate by prefix");
        Ok(removed)
    }

    // == Clear ==
    /// Removes all entries. Returns how many were dropped.
    pub fn clear(&self) -> Result<usize> {
        let mut inner = self.lock()?;
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.stats.record_invalidations(removed);
        inner.sync_len();
        debug!(removed, "cache cleared");
        Ok(removed)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - inner.entries.len();

        inner.stats.record_expirations(removed);
        inner.sync_len();
        Ok(removed)
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> Result<CacheStats> {
        let inner = self.lock()?;
        Ok(inner.stats.clone())
    }

    // == Length ==
    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poisons the store's mutex by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = self.inner.lock();
                    panic!("poisoning cache store");
                })
                .join();
        });
    }
}

impl Default for TtlStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
