//! Navigation-aware client caches.
//!
//! - [`PageCache`]: per-page fetched data, UI meta state and scroll offsets
//! - [`FeedCache`]: post lists that keep their scroll offset across refetches
//! - [`MessageCache`]: conversation list, unread badges and recent history
//! - [`EventQueue`] / [`CacheConsumer`]: forwarded realtime events applied
//!   in order
//!
//! ## Configuration
//!
//! Capacities are controlled via `navcache.toml`:
//!
//! ```toml
//! [cache]
//! page_data_limit = 256
//! feed_limit = 64
//! message_history_limit = 100
//! # ... see config.rs for all options
//! ```

mod config;
mod consumer;
mod events;
pub mod feed;
pub mod keys;
pub(crate) mod lock;
pub mod messages;
pub mod page;

pub use config::CacheConfig;
pub use consumer::{CacheConsumer, ConsumeReport};
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use feed::{FeedCache, FeedCacheValue};
pub use messages::{InsertOutcome, MessageCache};
pub use page::{Aged, CacheEntry, MetaEntry, PageCache};
