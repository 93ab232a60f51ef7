//! Cache event system.
//!
//! Realtime and fetch-completion callbacks forward what they observed into
//! an [`EventQueue`]; the [`super::consumer::CacheConsumer`] applies them to
//! the stores in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::messages::{ConversationPatch, Message, ReadReceipt};
use crate::domain::posts::Post;
use crate::infra::clock::Clock;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";
const METRIC_EVENT_DROPPED_TOTAL: &str = "navcache_event_dropped_total";
const METRIC_EVENT_QUEUE_DEPTH: &str = "navcache_event_queue_depth";

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for log correlation.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch, timestamp: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp,
        }
    }
}

/// Things the cache layer is told about. It never subscribes to a data
/// source itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    // Feeds and pages
    /// A feed fetch completed.
    FeedFetched { key: String, posts: Vec<Post> },
    /// A post was deleted; every cached view of it must go.
    PostDeleted { post_id: Uuid },
    /// Drop all page data under a key prefix.
    PageScopeInvalidated { prefix: String },

    // Chat
    MessageInserted { message: Message },
    ConversationUpdated { patch: ConversationPatch },
    ReadReceipt { receipt: ReadReceipt },

    // Session
    /// Logout or account switch.
    SessionReset,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FeedFetched { .. } => "feed_fetched",
            Self::PostDeleted { .. } => "post_deleted",
            Self::PageScopeInvalidated { .. } => "page_scope_invalidated",
            Self::MessageInserted { .. } => "message_inserted",
            Self::ConversationUpdated { .. } => "conversation_updated",
            Self::ReadReceipt { .. } => "read_receipt",
            Self::SessionReset => "session_reset",
        }
    }
}

/// Bounded FIFO of pending events. When full, the oldest event is dropped.
pub struct EventQueue {
    clock: Arc<dyn Clock>,
    limit: usize,
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(limit: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            limit: limit.max(1),
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind, epoch, self.clock.now());

        debug!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = event.kind.label(),
            "Cache event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        if queue.len() >= self.limit
            && let Some(oldest) = queue.pop_front()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                event_id = %oldest.id,
                event_kind = oldest.kind.label(),
                limit = self.limit,
                "Event queue full, dropped oldest event"
            );
            counter!(METRIC_EVENT_DROPPED_TOTAL).increment(1);
        }
        queue.push_back(event);
        gauge!(METRIC_EVENT_QUEUE_DEPTH).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events = queue.drain(..count).collect();
        gauge!(METRIC_EVENT_QUEUE_DEPTH).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
    }
}
