//! Page data cache.
//!
//! Three disjoint sub-stores keyed by string:
//!
//! - data: fetched page data, LRU-bounded, with age introspection and
//!   prefix invalidation
//! - meta: UI selection state (active tab, filters) that survives remounts
//!   and is never touched by data invalidation
//! - scroll: per-page scroll offsets
//!
//! Reads never apply a freshness policy; callers use
//! [`PageCache::get_with_age`] and decide for themselves.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::infra::clock::{Clock, elapsed_ms};
use crate::navigation::restore::RestorePolicy;
use crate::navigation::scroll::ScrollPositionStore;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::page";
const METRIC_PAGE_HIT_TOTAL: &str = "navcache_page_hit_total";
const METRIC_PAGE_MISS_TOTAL: &str = "navcache_page_miss_total";
const METRIC_PAGE_EVICT_TOTAL: &str = "navcache_page_evict_total";

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: OffsetDateTime,
}

/// Same shape as [`CacheEntry`], held in a separate key space.
pub type MetaEntry<V> = CacheEntry<V>;

/// A cached value together with how long ago it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Aged<V> {
    pub data: V,
    pub age_ms: u64,
}

impl<V> Aged<V> {
    pub fn is_older_than(&self, threshold: Duration) -> bool {
        u128::from(self.age_ms) > threshold.as_millis()
    }
}

pub struct PageCache<V = Value> {
    clock: Arc<dyn Clock>,
    data: RwLock<LruCache<String, CacheEntry<V>>>,
    /// Not LRU-bounded: a handful of keys per page, dropped on `reset`.
    meta: RwLock<HashMap<String, MetaEntry<V>>>,
    scroll: ScrollPositionStore,
}

impl<V: Clone> PageCache<V> {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>, policy: RestorePolicy) -> Self {
        Self {
            data: RwLock::new(LruCache::new(config.page_data_limit_non_zero())),
            meta: RwLock::new(HashMap::new()),
            scroll: ScrollPositionStore::new(clock.clone(), policy),
            clock,
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Unconditional upsert; the previous value is replaced, never merged.
    pub fn set(&self, key: &str, data: V) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        let displaced = rw_write(&self.data, SOURCE, "set").push(key.to_string(), entry);
        if let Some((evicted, _)) = displaced.filter(|(existing, _)| existing != key) {
            debug!(evicted_key = %evicted, "Page cache evicted least recently used entry");
            counter!(METRIC_PAGE_EVICT_TOTAL).increment(1);
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entry(key).map(|entry| entry.data)
    }

    pub fn get_with_age(&self, key: &str) -> Option<Aged<V>> {
        let now = self.clock.now();
        self.entry(key).map(|entry| Aged {
            age_ms: elapsed_ms(entry.timestamp, now),
            data: entry.data,
        })
    }

    fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let entry = rw_write(&self.data, SOURCE, "get").get(key).cloned();
        if entry.is_some() {
            counter!(METRIC_PAGE_HIT_TOTAL).increment(1);
        } else {
            counter!(METRIC_PAGE_MISS_TOTAL).increment(1);
        }
        entry
    }

    pub fn remove(&self, key: &str) {
        rw_write(&self.data, SOURCE, "remove").pop(key);
    }

    /// Drop every data entry whose key starts with `prefix`. Returns the
    /// number of entries removed.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut data = rw_write(&self.data, SOURCE, "invalidate");
        let doomed: Vec<String> = data
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            data.pop(key.as_str());
        }
        debug!(prefix, removed = doomed.len(), "Page cache prefix invalidated");
        doomed.len()
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.data, SOURCE, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.data, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Data keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        rw_read(&self.data, SOURCE, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    // ========================================================================
    // Meta
    // ========================================================================

    pub fn set_meta(&self, key: &str, data: V) {
        let entry = MetaEntry {
            data,
            timestamp: self.clock.now(),
        };
        rw_write(&self.meta, SOURCE, "set_meta").insert(key.to_string(), entry);
    }

    pub fn get_meta(&self, key: &str) -> Option<V> {
        rw_read(&self.meta, SOURCE, "get_meta")
            .get(key)
            .map(|entry| entry.data.clone())
    }

    pub fn clear_meta(&self) {
        rw_write(&self.meta, SOURCE, "clear_meta").clear();
    }

    // ========================================================================
    // Scroll
    // ========================================================================

    pub fn set_scroll(&self, key: &str, y: u32) {
        self.scroll.save(key, y);
    }

    pub fn get_scroll(&self, key: &str) -> u32 {
        self.scroll.offset(key)
    }

    pub fn clear_scroll(&self, key: &str) {
        self.scroll.clear(key);
    }

    pub fn scroll_store(&self) -> &ScrollPositionStore {
        &self.scroll
    }

    /// Logout reset: every sub-store is emptied.
    pub fn reset(&self) {
        self.invalidate_all();
        self.clear_meta();
        self.scroll.clear_all();
    }
}
