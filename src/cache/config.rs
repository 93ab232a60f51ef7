//! Cache configuration.
//!
//! Controls store capacities and event consumption via `navcache.toml`.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_DATA_LIMIT: usize = 256;
const DEFAULT_FEED_LIMIT: usize = 64;
const DEFAULT_MESSAGE_HISTORY_LIMIT: usize = 100;
const DEFAULT_EVENT_QUEUE_LIMIT: usize = 1024;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

/// Cache configuration from the `[cache]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries in the page data sub-store (LRU).
    pub page_data_limit: usize,
    /// Maximum cached feeds (LRU).
    pub feed_limit: usize,
    /// Maximum recent messages kept per conversation.
    pub message_history_limit: usize,
    /// Maximum pending events before the oldest are dropped.
    pub event_queue_limit: usize,
    /// Maximum events applied per consumption batch.
    pub consume_batch_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_data_limit: DEFAULT_PAGE_DATA_LIMIT,
            feed_limit: DEFAULT_FEED_LIMIT,
            message_history_limit: DEFAULT_MESSAGE_HISTORY_LIMIT,
            event_queue_limit: DEFAULT_EVENT_QUEUE_LIMIT,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
        }
    }
}

impl CacheConfig {
    /// Returns the page data limit as NonZeroUsize, clamping to 1 if zero.
    pub fn page_data_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_data_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the feed limit as NonZeroUsize, clamping to 1 if zero.
    pub fn feed_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.feed_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn message_history_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.message_history_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
