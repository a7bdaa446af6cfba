//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL expiration and LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};

// == Cache Store ==
/// Bounded key-value storage with per-entry TTL and least-recently-used eviction.
///
/// All cleanup is on demand: expired entries are purged when `get` or `has`
/// touches them, or by an explicit `purge_expired` call.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL in milliseconds for entries stored without an explicit TTL
    default_ttl_ms: u64,
    /// Next access sequence number
    access_seq: u64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore reading wall-clock time.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries, at least 1
    /// * `default_ttl_ms` - TTL in milliseconds for entries without explicit TTL
    pub fn new(max_size: usize, default_ttl_ms: u64) -> Self {
        Self::with_clock(max_size, default_ttl_ms, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore driven by the given clock.
    pub fn with_clock(max_size: usize, default_ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(max_size),
            max_size,
            default_ttl_ms,
            access_seq: 0,
            clock,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    // == Set ==
    /// Stores a value, replacing any previous value and expiry for `key`.
    ///
    /// When the store is at capacity one entry is evicted first, the one
    /// with the oldest access. The check runs before insertion even if `key`
    /// is already present.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds (uses the default if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let key = key.into();

        if self.entries.len() >= self.max_size {
            self.evict_lru();
        }

        let now = self.clock.now_ms();
        let seq = self.next_seq();
        let ttl = ttl_ms.unwrap_or(self.default_ttl_ms);
        self.entries.insert(key, CacheEntry::new(value, now, ttl, seq));
    }

    // == Get ==
    /// Returns a clone of the value for `key` if present and not expired.
    ///
    /// A hit refreshes the entry's recency. An expired entry is removed and
    /// counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_miss();
            debug!(key, "cache miss (expired)");
            return None;
        }

        let seq = self.next_seq();
        let entry = self.entries.get_mut(key)?;
        entry.touch(now, seq);
        let value = entry.value.clone();
        self.stats.record_hit();
        debug!(key, "cache hit");
        Some(value)
    }

    // == Has ==
    /// Returns true if `key` holds an unexpired value.
    ///
    /// Does not refresh recency or count toward hits and misses, but does
    /// remove the entry if it has expired.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        match self.entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(false) => true,
            Some(true) => {
                self.entries.remove(key);
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry and resets the statistics counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.reset();
    }

    // == Invalidate Pattern ==
    /// Removes every key that starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.size = self.entries.len();
        stats
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    /// Evicts the entry with the smallest `(last_accessed, access_seq)`.
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.recency())
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&victim);
        self.stats.record_eviction();
        debug!(key = %victim, "evicted least recently used entry");
        Some(victim)
    }
}
