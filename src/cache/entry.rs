//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and recency metadata.

// == Cache Entry ==
/// A single cached value with its expiry and last access time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Last successful read or write (Unix milliseconds)
    pub last_accessed: u64,
    /// Store-wide access sequence number, orders touches within one millisecond
    pub access_seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl_ms` milliseconds.
    pub fn new(value: V, now: u64, ttl_ms: u64, access_seq: u64) -> Self {
        Self {
            value,
            expires_at: now.saturating_add(ttl_ms),
            last_accessed: now,
            access_seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is still valid at exactly `expires_at`; it expires on the
    /// first millisecond after.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: u64, access_seq: u64) {
        self.last_accessed = now;
        self.access_seq = access_seq;
    }

    /// Eviction ordering key: smaller means less recently used.
    pub(crate) fn recency(&self) -> (u64, u64) {
        (self.last_accessed, self.access_seq)
    }
}
