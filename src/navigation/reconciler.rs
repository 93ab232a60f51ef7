//! Keeps the client router in step with the browser after native back/forward
//! navigation.
//!
//! On a pop event the router is given a short debounce to react on its own.
//! If its URL still disagrees with the browser's, the reconciler replaces the
//! router location with the browser's, asks for fresh data, and re-checks
//! after a settle delay. A reconciliation that still has not converged by then
//! escalates to a full document reload.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::routes::RouteKey;

const METRIC_RECONCILE_TOTAL: &str = "navcache_reconcile_total";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigateOptions {
    /// Keep the current scroll offset instead of jumping to the top.
    pub preserve_scroll: bool,
}

/// The client-side router.
pub trait AppRouter: Send + Sync {
    fn current_path(&self) -> String;
    fn current_query(&self) -> String;
    /// Navigate without pushing a history entry.
    fn navigate_replace(&self, url: &str, options: NavigateOptions);
    fn refresh_data(&self);
    fn prefetch(&self, url: &str);

    /// The URL the router believes it is showing.
    fn current_url(&self) -> RouteKey {
        RouteKey::new(&self.current_path(), &self.current_query())
    }
}

/// The browser's own view of history.
pub trait BrowserHistory: Send + Sync {
    /// Path plus query string of the document location.
    fn current_url(&self) -> RouteKey;
    /// Last-resort recovery: drop all in-memory state and reload.
    fn reload_document(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub debounce: Duration,
    pub settle: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            settle: DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Synced,
    Syncing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The router caught up on its own during the debounce.
    AlreadySynced,
    /// Another reconciliation was already in flight.
    Skipped,
    /// The forced replace converged.
    Resynced,
    /// The forced replace did not converge; the document was reloaded.
    Reloaded,
}

impl ReconcileOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::AlreadySynced => "already_synced",
            Self::Skipped => "skipped",
            Self::Resynced => "resynced",
            Self::Reloaded => "reloaded",
        }
    }
}

pub struct HistoryReconciler {
    router: Arc<dyn AppRouter>,
    browser: Arc<dyn BrowserHistory>,
    config: ReconcilerConfig,
    syncing: AtomicBool,
}

/// Releases the in-flight flag when a reconciliation ends, including when
/// its future is dropped mid-way.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl HistoryReconciler {
    pub fn new(
        router: Arc<dyn AppRouter>,
        browser: Arc<dyn BrowserHistory>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            router,
            browser,
            config,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ReconcileState {
        if self.syncing.load(Ordering::Acquire) {
            ReconcileState::Syncing
        } else {
            ReconcileState::Synced
        }
    }

    /// Handle one native back/forward navigation event.
    pub async fn on_pop_state(&self) -> ReconcileOutcome {
        let outcome = self.reconcile().await;
        counter!(METRIC_RECONCILE_TOTAL, "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Run [`Self::on_pop_state`] on the tokio runtime.
    pub fn spawn_pop_state(self: &Arc<Self>) -> JoinHandle<ReconcileOutcome> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move { reconciler.on_pop_state().await })
    }

    async fn reconcile(&self) -> ReconcileOutcome {
        if self.syncing.load(Ordering::Acquire) {
            debug!("Pop event ignored: reconciliation already in flight");
            return ReconcileOutcome::Skipped;
        }

        let browser_url = self.browser.current_url();
        tokio::time::sleep(self.config.debounce).await;

        if self.router.current_url() == browser_url {
            return ReconcileOutcome::AlreadySynced;
        }

        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Pop event ignored: reconciliation already in flight");
            return ReconcileOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.syncing);

        info!(
            router_url = %self.router.current_url(),
            browser_url = %browser_url,
            "Router diverged from browser history; resyncing"
        );
        self.router.navigate_replace(
            browser_url.as_str(),
            NavigateOptions {
                preserve_scroll: true,
            },
        );
        self.router.refresh_data();

        tokio::time::sleep(self.config.settle).await;

        let router_url = self.router.current_url();
        let browser_url = self.browser.current_url();
        if router_url == browser_url {
            return ReconcileOutcome::Resynced;
        }

        warn!(
            router_url = %router_url,
            browser_url = %browser_url,
            "Router did not converge after resync; reloading document"
        );
        self.browser.reload_document();
        ReconcileOutcome::Reloaded
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Router double. With `follows_replace` it adopts the URL it is told to
    /// replace with; without it, it stays stuck.
    #[derive(Debug)]
    pub(crate) struct FakeRouter {
        pub(crate) url: Mutex<String>,
        pub(crate) follows_replace: bool,
        pub(crate) replaces: Mutex<Vec<(String, NavigateOptions)>>,
        pub(crate) refreshes: AtomicUsize,
        pub(crate) prefetched: Mutex<Vec<String>>,
    }

    impl FakeRouter {
        pub(crate) fn new(url: &str, follows_replace: bool) -> Self {
            Self {
                url: Mutex::new(url.to_string()),
                follows_replace,
                replaces: Mutex::new(Vec::new()),
                refreshes: AtomicUsize::new(0),
                prefetched: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn replace_count(&self) -> usize {
            self.replaces.lock().unwrap().len()
        }
    }

    impl AppRouter for FakeRouter {
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
            self.replaces
                .lock()
                .unwrap()
                .push((url.to_string(), options));
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

    #[derive(Debug)]
    pub(crate) struct FakeBrowser {
        pub(crate) url: Mutex<String>,
        pub(crate) reloads: AtomicUsize,
    }

    impl FakeBrowser {
        pub(crate) fn new(url: &str) -> Self {
            Self {
                url: Mutex::new(url.to_string()),
                reloads: AtomicUsize::new(0),
            }
        }
    }

    impl BrowserHistory for FakeBrowser {
        fn current_url(&self) -> RouteKey {
            RouteKey::from(self.url.lock().unwrap().as_str())
        }

        fn reload_document(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }
}
