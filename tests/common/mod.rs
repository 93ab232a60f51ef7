#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use navcache::cache::CacheConfig;
use navcache::config::{LogFormat, LoggingSettings, SessionSettings, Settings};
use navcache::context::NavContext;
use navcache::domain::posts::{GeoPoint, Post, PostStatus};
use navcache::domain::routes::RouteKey;
use navcache::infra::clock::ManualClock;
use navcache::infra::session_store::SessionStore;
use navcache::navigation::{AppRouter, BrowserHistory, NavigateOptions, NavigationConfig, Viewport};
use time::OffsetDateTime;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

pub fn settings() -> Settings {
    Settings {
        logging: LoggingSettings {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        },
        cache: CacheConfig::default(),
        navigation: NavigationConfig::default(),
        session: SessionSettings::default(),
    }
}

pub fn context_with(store: Arc<dyn SessionStore>) -> (Arc<ManualClock>, NavContext) {
    let clock = Arc::new(ManualClock::at_epoch());
    let context = NavContext::new(&settings(), clock.clone(), store);
    (clock, context)
}

pub fn post(n: u128) -> Post {
    Post {
        id: Uuid::from_u128(n),
        user_id: Uuid::from_u128(9000 + n),
        category: "traffic".to_string(),
        comment: Some(format!("incident {n}")),
        location: GeoPoint {
            latitude: 6.45,
            longitude: 3.39,
        },
        address: None,
        is_anonymous: false,
        status: PostStatus::Live,
        is_sensitive: false,
        confirmations: 0,
        views: 0,
        comment_count: None,
        report_count: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
        media: Vec::new(),
        tags: Vec::new(),
    }
}

pub fn ids(posts: &[Post]) -> Vec<u128> {
    posts.iter().map(|post| post.id.as_u128()).collect()
}

/// A document whose height grows by `growth` pixels every time the page
/// scrolls, up to `cap`. Scrolling clamps to the current height.
pub struct Document {
    state: Mutex<(u32, u32)>,
    growth: u32,
    cap: u32,
}

impl Document {
    pub fn new(initial_height: u32, growth: u32, cap: u32) -> Self {
        Self {
            state: Mutex::new((initial_height, 0)),
            growth,
            cap,
        }
    }

    pub fn scrolled_to(self, offset: u32) -> Self {
        self.state.lock().unwrap().1 = offset;
        self
    }
}

impl Viewport for Document {
    fn scroll_offset(&self) -> u32 {
        self.state.lock().unwrap().1
    }

    fn scroll_to(&self, offset: u32) {
        let mut state = self.state.lock().unwrap();
        state.1 = offset.min(state.0);
        state.0 = state.0.saturating_add(self.growth).min(self.cap);
    }
}

pub struct Router {
    pub url: Mutex<String>,
    pub follows_replace: bool,
    pub replaces: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub prefetched: Mutex<Vec<String>>,
}

impl Router {
    pub fn new(url: &str, follows_replace: bool) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            follows_replace,
            replaces: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            prefetched: Mutex::new(Vec::new()),
        }
    }
}

impl AppRouter for Router {
    fn current_path(&self) -> String {
        RouteKey::from(self.url.lock().unwrap().as_str())
            .path()
            .to_string()
    }

    fn current_query(&self) -> String {
        self.url
            .lock()
            .unwrap()
            .split_once('?')
            .map(|(_, query)| query.to_string())
            .unwrap_or_default()
    }

    fn navigate_replace(&self, url: &str, options: NavigateOptions) {
        assert!(options.preserve_scroll);
        self.replaces.fetch_add(1, Ordering::SeqCst);
        if self.follows_replace {
            *self.url.lock().unwrap() = url.to_string();
        }
    }

    fn refresh_data(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn prefetch(&self, url: &str) {
        self.prefetched.lock().unwrap().push(url.to_string());
    }
}

pub struct Browser {
    pub url: Mutex<String>,
    pub reloads: AtomicUsize,
}

impl Browser {
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            reloads: AtomicUsize::new(0),
        }
    }
}

impl BrowserHistory for Browser {
    fn current_url(&self) -> RouteKey {
        RouteKey::from(self.url.lock().unwrap().as_str())
    }

    fn reload_document(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}
