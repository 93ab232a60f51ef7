//! Cached post lists keyed by feed identity ("home", "profile:<id>:posts").
//!
//! The scroll offset lives next to the items so that a background refetch
//! replacing the list keeps the reader's place.

use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::domain::posts::{FeedItem, Post};
use crate::infra::clock::Clock;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::feed";
const METRIC_FEED_EVICT_TOTAL: &str = "navcache_feed_evict_total";
const METRIC_FEED_POST_REMOVED_TOTAL: &str = "navcache_feed_post_removed_total";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedCacheValue<P> {
    pub items: Vec<P>,
    pub updated_at: OffsetDateTime,
    pub scroll_y: u32,
}

pub struct FeedCache<P = Post> {
    clock: Arc<dyn Clock>,
    feeds: RwLock<LruCache<String, FeedCacheValue<P>>>,
}

impl<P: FeedItem + Clone> FeedCache<P> {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            feeds: RwLock::new(LruCache::new(config.feed_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &str) -> Option<FeedCacheValue<P>> {
        rw_write(&self.feeds, SOURCE, "get").get(key).cloned()
    }

    /// Read without touching recency.
    pub fn peek(&self, key: &str) -> Option<FeedCacheValue<P>> {
        rw_read(&self.feeds, SOURCE, "peek").peek(key).cloned()
    }

    /// Replace the items of `key`, keeping any recorded scroll offset.
    pub fn set_posts(&self, key: &str, items: Vec<P>) {
        let now = self.clock.now();
        let mut feeds = rw_write(&self.feeds, SOURCE, "set_posts");
        let scroll_y = feeds.peek(key).map_or(0, |feed| feed.scroll_y);
        let displaced = feeds.push(
            key.to_string(),
            FeedCacheValue {
                items,
                updated_at: now,
                scroll_y,
            },
        );
        record_eviction(displaced, key);
    }

    /// Record the scroll offset of `key`. A feed that was never fetched gets
    /// an empty entry so the offset is not lost.
    pub fn set_scroll(&self, key: &str, y: u32) {
        let mut feeds = rw_write(&self.feeds, SOURCE, "set_scroll");
        if let Some(feed) = feeds.get_mut(key) {
            feed.scroll_y = y;
            return;
        }
        let displaced = feeds.push(
            key.to_string(),
            FeedCacheValue {
                items: Vec::new(),
                updated_at: self.clock.now(),
                scroll_y: y,
            },
        );
        record_eviction(displaced, key);
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.feeds, SOURCE, "invalidate_all").clear();
    }

    /// Remove `post_id` from every cached feed. Feeds that never contained
    /// it keep their `updated_at`. Returns the number of feeds touched.
    pub fn remove_post(&self, post_id: Uuid) -> usize {
        let mut feeds = rw_write(&self.feeds, SOURCE, "remove_post");
        let mut touched = 0;
        for (_, feed) in feeds.iter_mut() {
            let before = feed.items.len();
            feed.items.retain(|item| item.item_id() != post_id);
            if feed.items.len() != before {
                touched += 1;
            }
        }

        debug!(%post_id, feeds = touched, "Removed post from cached feeds");
        counter!(METRIC_FEED_POST_REMOVED_TOTAL).increment(touched as u64);
        touched
    }

    /// Cached feed keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        rw_read(&self.feeds, SOURCE, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.feeds, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn record_eviction<P>(displaced: Option<(String, FeedCacheValue<P>)>, key: &str) {
    if let Some((evicted, _)) = displaced.filter(|(existing, _)| existing != key) {
        debug!(evicted_key = %evicted, "Feed cache evicted least recently used feed");
        counter!(METRIC_FEED_EVICT_TOTAL).increment(1);
    }
}
