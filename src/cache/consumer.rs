//! Cache consumer.
//!
//! Drains forwarded events from the queue and applies them to the stores.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::posts::Post;
use crate::navigation::HandoffChannel;

use super::config::CacheConfig;
use super::events::{CacheEvent, EventKind, EventQueue};
use super::feed::FeedCache;
use super::keys::post_scope;
use super::messages::MessageCache;
use super::page::PageCache;

const METRIC_CACHE_CONSUME_MS: &str = "navcache_consume_ms";

/// What one consumption batch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumeReport {
    pub events: usize,
    /// Feeds that lost at least one deleted post.
    pub feeds_touched: usize,
    /// Page data entries dropped by scope invalidation.
    pub pages_invalidated: usize,
    pub resets: usize,
}

impl ConsumeReport {
    fn absorb(&mut self, other: ConsumeReport) {
        self.events += other.events;
        self.feeds_touched += other.feeds_touched;
        self.pages_invalidated += other.pages_invalidated;
        self.resets += other.resets;
    }
}

pub struct CacheConsumer {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    pages: Arc<PageCache>,
    feeds: Arc<FeedCache<Post>>,
    messages: Arc<MessageCache>,
    handoff: Arc<HandoffChannel>,
}

impl CacheConsumer {
    pub fn new(
        config: CacheConfig,
        queue: Arc<EventQueue>,
        pages: Arc<PageCache>,
        feeds: Arc<FeedCache<Post>>,
        messages: Arc<MessageCache>,
        handoff: Arc<HandoffChannel>,
    ) -> Self {
        Self {
            config,
            queue,
            pages,
            feeds,
            messages,
            handoff,
        }
    }

    /// Apply one batch of at most `consume_batch_limit` events.
    #[instrument(skip(self))]
    pub fn consume(&self) -> ConsumeReport {
        let started_at = Instant::now();
        let events = self.queue.drain(self.config.consume_batch_limit);
        if events.is_empty() {
            return ConsumeReport::default();
        }

        let mut report = ConsumeReport {
            events: events.len(),
            ..Default::default()
        };
        for event in &events {
            self.apply(event, &mut report);
        }

        info!(
            event_count = report.events,
            feeds_touched = report.feeds_touched,
            pages_invalidated = report.pages_invalidated,
            resets = report.resets,
            "Cache consumption complete"
        );
        histogram!(METRIC_CACHE_CONSUME_MS)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        report
    }

    /// Keep consuming until the queue is empty.
    pub fn consume_all(&self) -> ConsumeReport {
        let mut total = ConsumeReport::default();
        loop {
            let batch = self.consume();
            if batch.events == 0 {
                return total;
            }
            total.absorb(batch);
        }
    }

    fn apply(&self, event: &CacheEvent, report: &mut ConsumeReport) {
        match &event.kind {
            EventKind::FeedFetched { key, posts } => {
                self.feeds.set_posts(key, posts.clone());
            }
            EventKind::PostDeleted { post_id } => {
                report.feeds_touched += self.feeds.remove_post(*post_id);
                report.pages_invalidated += self.pages.invalidate(&post_scope(*post_id));
            }
            EventKind::PageScopeInvalidated { prefix } => {
                report.pages_invalidated += self.pages.invalidate(prefix);
            }
            EventKind::MessageInserted { message } => {
                self.messages.apply_message_insert(message);
            }
            EventKind::ConversationUpdated { patch } => {
                self.messages.apply_conversation_update(patch);
            }
            EventKind::ReadReceipt { receipt } => {
                self.messages.apply_read_receipt(receipt);
            }
            EventKind::SessionReset => {
                self.pages.reset();
                self.feeds.invalidate_all();
                self.messages.clear();
                self.handoff.reset();
                report.resets += 1;
            }
        }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}
