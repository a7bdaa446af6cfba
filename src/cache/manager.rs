//! Cache Manager Module
//!
//! Shareable async handle around a `CacheStore`, adding read-through `get_or_set`.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, Clock};

// == Cache Manager ==
/// Cloneable handle to one cache store.
///
/// Construct it once at startup and pass clones to whatever needs caching;
/// every clone sees the same entries. Each call holds the store lock only for
/// its own synchronous body.
#[derive(Debug)]
pub struct CacheManager<V> {
    store: Arc<RwLock<CacheStore<V>>>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V: Clone> CacheManager<V> {
    /// Creates a manager over a fresh store using wall-clock time.
    pub fn new(max_size: usize, default_ttl_ms: u64) -> Self {
        Self::from_store(CacheStore::new(max_size, default_ttl_ms))
    }

    /// Creates a manager over a fresh store driven by `clock`.
    pub fn with_clock(max_size: usize, default_ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self::from_store(CacheStore::with_clock(max_size, default_ttl_ms, clock))
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Gets a clone of the value for `key`, counting a hit or a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        // Write lock: a hit refreshes recency and counters
        self.store.write().await.get(key)
    }

    /// Stores `value` under `key`; `None` uses the default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        self.store.write().await.set(key, value, ttl_ms);
    }

    /// Stores `value` only if `keep()` still holds once the store lock is taken.
    ///
    /// Returns whether the value was stored.
    pub async fn set_if<F>(
        &self,
        key: impl Into<String>,
        value: V,
        ttl_ms: Option<u64>,
        keep: F,
    ) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut store = self.store.write().await;
        if !keep() {
            return false;
        }
        store.set(key, value, ttl_ms);
        true
    }

    /// Deletes `key`, returning whether it was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    /// Checks for a live entry without touching recency or counters.
    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    /// Removes every entry and resets the counters.
    pub async fn clear(&self) {
        self.store.write().await.clear();
        info!("cache cleared");
    }

    /// Removes every key starting with `prefix`, returning how many went.
    pub async fn invalidate_pattern(&self, prefix: &str) -> usize {
        let removed = self.store.write().await.invalidate_pattern(prefix);
        info!(prefix, removed, "cache namespace invalidated");
        removed
    }

    /// Drops expired entries now, returning how many went.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    /// Returns a snapshot of size and counters.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Get Or Set ==
    /// Returns the cached value for `key`, or runs `fetcher` and caches its result.
    ///
    /// The lock is released while `fetcher` runs, so concurrent callers that
    /// miss on the same key each run their own fetcher and the last one to
    /// finish wins the slot. A fetcher error is returned as is and nothing is
    /// cached.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        fetcher: F,
        ttl_ms: Option<u64>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        debug!(key, "populating cache entry");
        let value = fetcher().await?;
        self.set(key, value.clone(), ttl_ms).await;
        Ok(value)
    }
}
