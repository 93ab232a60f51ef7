//! Navigation-state configuration from the `[navigation]` table.
//!
//! The restore tolerance and retry bound are empirically tuned, not a
//! contract; they are exposed here so deployments can adjust them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prefetch::DEFAULT_PREFETCH_ROUTES;
use super::reconciler::ReconcilerConfig;
use super::restore::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TOLERANCE_PX, RestorePolicy};
use super::route_scroll::DEFAULT_ROUTE_SCROLL_KEY;

const DEFAULT_HANDOFF_TTL_MS: u64 = 5000;
const DEFAULT_RECONCILE_DEBOUNCE_MS: u64 = 200;
const DEFAULT_RECONCILE_SETTLE_MS: u64 = 600;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct NavigationConfig {
    /// Validity window of a playback handoff.
    pub handoff_ttl_ms: u64,
    /// Scroll restore attempts before giving up.
    pub restore_max_attempts: u32,
    /// Distance in pixels that counts as restored.
    pub restore_tolerance_px: u32,
    /// Session store key holding the route scroll map.
    pub route_scroll_storage_key: String,
    /// Route prefixes with their own scroller.
    pub scroll_excluded_prefixes: Vec<String>,
    /// Time the router gets to react to a pop event on its own.
    pub reconcile_debounce_ms: u64,
    /// Time a forced resync gets before the reload fallback.
    pub reconcile_settle_ms: u64,
    /// Routes prefetched at startup.
    pub prefetch_routes: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            handoff_ttl_ms: DEFAULT_HANDOFF_TTL_MS,
            restore_max_attempts: DEFAULT_MAX_ATTEMPTS,
            restore_tolerance_px: DEFAULT_TOLERANCE_PX,
            route_scroll_storage_key: DEFAULT_ROUTE_SCROLL_KEY.to_string(),
            scroll_excluded_prefixes: vec!["/watch".to_string()],
            reconcile_debounce_ms: DEFAULT_RECONCILE_DEBOUNCE_MS,
            reconcile_settle_ms: DEFAULT_RECONCILE_SETTLE_MS,
            prefetch_routes: DEFAULT_PREFETCH_ROUTES
                .iter()
                .map(|route| route.to_string())
                .collect(),
        }
    }
}

impl NavigationConfig {
    pub fn handoff_ttl(&self) -> Duration {
        Duration::from_millis(self.handoff_ttl_ms)
    }

    pub fn restore_policy(&self) -> RestorePolicy {
        RestorePolicy {
            max_attempts: self.restore_max_attempts,
            tolerance_px: self.restore_tolerance_px,
        }
    }

    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            debounce: Duration::from_millis(self.reconcile_debounce_ms),
            settle: Duration::from_millis(self.reconcile_settle_ms),
        }
    }
}
