//! Tiered fingerprint cache: a bounded L1 (hot) + L2 (warm) LRU pair, with
//! read-triggered promotion from L2 into L1 after a threshold of warm hits.
//! Used by `canonmap-fingerprint` to memoize the cost of serializing
//! container values; cache keys are content-derived stable ids, never
//! randomized per-object identities (see DESIGN.md).

mod lru;

use lru::LruLevel;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub l1_capacity: usize,
    pub l2_capacity: usize,
    pub promote_threshold: u32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            l1_capacity: 1_000,
            l2_capacity: 5_000,
            promote_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CacheStats {
    l1_hits: u64,
    l2_hits: u64,
    misses: u64,
    l1_evictions: u64,
    l2_evictions: u64,
}

pub struct TieredCache<V: Clone> {
    opts: CacheOptions,
    l1: LruLevel<V>,
    l2: LruLevel<V>,
    /// Per-key count of L2 hits since last promotion (or since insertion).
    l2_access_counts: HashMap<String, u32>,
    stats: CacheStats,
}

impl<V: Clone> TieredCache<V> {
    pub fn new(opts: CacheOptions) -> Self {
        TieredCache {
            l1: LruLevel::new(opts.l1_capacity),
            l2: LruLevel::new(opts.l2_capacity),
            l2_access_counts: HashMap::new(),
            stats: CacheStats::default(),
            opts,
        }
    }

    /// L1 hit: returned directly. L1 miss + L2 hit: the access counter for
    /// `key` is incremented; upon crossing `promote_threshold` the entry is
    /// copied into L1 (evicting L1's LRU tail if necessary) and the counter
    /// resets. Miss on both levels returns `None` — the caller computes the
    /// fingerprint and calls `put`.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if let Some(v) = self.l1.touch_get(key) {
            self.stats.l1_hits += 1;
            return Some(v);
        }

        let value = self.l2.touch_get(key)?;
        self.stats.l2_hits += 1;

        let count = self.l2_access_counts.entry(key.to_string()).or_insert(0);
        *count += 1;

        if *count >= self.opts.promote_threshold {
            self.l2_access_counts.remove(key);
            if let Some(evicted) = self.l1.insert(key.to_string(), value.clone()) {
                self.stats.l1_evictions += 1;
                tracing::debug!(evicted, "cache: L1 eviction on promotion");
            }
        }

        Some(value)
    }

    /// New entries always land in L2 only, per spec — promotion happens
    /// purely through repeated reads, never on write.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(evicted) = self.l2.insert(key, value) {
            self.stats.l2_evictions += 1;
            self.l2_access_counts.remove(&evicted);
            tracing::debug!(evicted, "cache: L2 eviction");
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.l1.remove(key);
        self.l2.remove(key);
        self.l2_access_counts.remove(key);
    }

    pub fn clear(&mut self) {
        self.l1.clear();
        self.l2.clear();
        self.l2_access_counts.clear();
    }

    pub fn stats(&self) -> CacheReport {
        CacheReport {
            l1_hits: self.stats.l1_hits,
            l2_hits: self.stats.l2_hits,
            misses: self.stats.misses,
            l1_evictions: self.stats.l1_evictions,
            l2_evictions: self.stats.l2_evictions,
            l1_size: self.l1.len(),
            l2_size: self.l2.len(),
        }
    }

    /// Records a miss on both levels. Exposed separately from `get` so that
    /// callers who short-circuit before calling `get` (e.g. because caching
    /// is disabled) don't double count.
    pub fn record_miss(&mut self) {
        self.stats.misses += 1;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.l1.peek(key).is_some() || self.l2.peek(key).is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheReport {
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub misses: u64,
    pub l1_evictions: u64,
    pub l2_evictions: u64,
    pub l1_size: usize,
    pub l2_size: usize,
}
