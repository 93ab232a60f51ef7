//! Root provider owning one instance of every store for a session.
//!
//! Consumers receive `Arc` handles to the stores, never the underlying maps.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::cache::{
    CacheConsumer, ConsumeReport, EventKind, EventQueue, FeedCache, MessageCache, PageCache,
};
use crate::config::Settings;
use crate::domain::messages::Conversation;
use crate::domain::posts::Post;
use crate::infra::clock::Clock;
use crate::infra::session_store::SessionStore;
use crate::navigation::route_scroll::RouteOffsets;
use crate::navigation::{
    AppRouter, BrowserHistory, HandoffChannel, HistoryReconciler, NavigationConfig,
    RoutePrefetcher, RouteScrollKeeper,
};

pub struct NavContext {
    navigation: NavigationConfig,
    pages: Arc<PageCache>,
    feeds: Arc<FeedCache<Post>>,
    messages: Arc<MessageCache>,
    handoff: Arc<HandoffChannel>,
    route_scroll: Arc<RouteScrollKeeper>,
    consumer: CacheConsumer,
}

impl NavContext {
    pub fn new(
        settings: &Settings,
        clock: Arc<dyn Clock>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let cache = &settings.cache;
        let navigation = settings.navigation.clone();
        let policy = navigation.restore_policy();

        let pages = Arc::new(PageCache::new(cache, clock.clone(), policy));
        let feeds = Arc::new(FeedCache::new(cache, clock.clone()));
        let messages = Arc::new(MessageCache::new(
            cache,
            clock.clone(),
            session_store.clone(),
        ));
        let handoff = Arc::new(HandoffChannel::new(clock.clone(), navigation.handoff_ttl()));
        let route_scroll = Arc::new(RouteScrollKeeper::new(
            session_store,
            navigation.route_scroll_storage_key.clone(),
            navigation.scroll_excluded_prefixes.clone(),
            policy,
        ));
        let queue = Arc::new(EventQueue::new(cache.event_queue_limit, clock));
        let consumer = CacheConsumer::new(
            cache.clone(),
            queue,
            pages.clone(),
            feeds.clone(),
            messages.clone(),
            handoff.clone(),
        );

        Self {
            navigation,
            pages,
            feeds,
            messages,
            handoff,
            route_scroll,
            consumer,
        }
    }

    pub fn pages(&self) -> Arc<PageCache> {
        Arc::clone(&self.pages)
    }

    pub fn feeds(&self) -> Arc<FeedCache<Post>> {
        Arc::clone(&self.feeds)
    }

    pub fn messages(&self) -> Arc<MessageCache> {
        Arc::clone(&self.messages)
    }

    pub fn handoff(&self) -> Arc<HandoffChannel> {
        Arc::clone(&self.handoff)
    }

    pub fn route_scroll(&self) -> Arc<RouteScrollKeeper> {
        Arc::clone(&self.route_scroll)
    }

    pub fn events(&self) -> Arc<EventQueue> {
        Arc::clone(self.consumer.queue())
    }

    pub fn publish(&self, kind: EventKind) {
        self.consumer.queue().publish(kind);
    }

    /// Apply every pending event.
    pub fn consume(&self) -> ConsumeReport {
        self.consumer.consume_all()
    }

    /// Reconciler wired to this session's timing settings.
    pub fn reconciler(
        &self,
        router: Arc<dyn AppRouter>,
        browser: Arc<dyn BrowserHistory>,
    ) -> Arc<HistoryReconciler> {
        Arc::new(HistoryReconciler::new(
            router,
            browser,
            self.navigation.reconciler(),
        ))
    }

    pub fn prefetcher(&self, router: Arc<dyn AppRouter>) -> RoutePrefetcher {
        RoutePrefetcher::new(router, self.navigation.prefetch_routes.clone())
    }

    /// Logout reset. The route scroll map belongs to the browser session and
    /// is kept.
    pub fn reset(&self) {
        self.pages.reset();
        self.feeds.invalidate_all();
        self.messages.clear();
        self.handoff.reset();
        self.consumer.queue().clear();
        info!("Navigation context reset");
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let feeds = self
            .feeds
            .keys()
            .into_iter()
            .filter_map(|key| {
                let feed = self.feeds.peek(&key)?;
                Some((
                    key,
                    FeedSummary {
                        items: feed.items.iter().map(|post| post.id).collect(),
                        scroll_y: feed.scroll_y,
                        updated_at: feed.updated_at,
                    },
                ))
            })
            .collect();
        let queue = self.consumer.queue();

        CacheSnapshot {
            pages: self.pages.keys(),
            feeds,
            conversations: self.messages.conversations(),
            total_unread: self.messages.total_unread(),
            active_conversation: self.messages.active(),
            route_offsets: self.route_scroll.offsets(),
            pending_events: queue.len(),
            dropped_events: queue.dropped(),
        }
    }
}

/// Serializable view of the session's cached state.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub pages: Vec<String>,
    pub feeds: BTreeMap<String, FeedSummary>,
    pub conversations: Vec<Conversation>,
    pub total_unread: u32,
    pub active_conversation: Option<Uuid>,
    pub route_offsets: RouteOffsets,
    pub pending_events: usize,
    pub dropped_events: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub items: Vec<Uuid>,
    pub scroll_y: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
