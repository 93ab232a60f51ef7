//! Route-level scroll persistence that survives a full reload.
//!
//! The whole `{ routeKey: offset }` map lives as a single JSON object under a
//! versioned key in the session store. Every save is a read-modify-write of
//! that object so routes never clobber each other's offsets.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::routes::RouteKey;
use crate::infra::session_store::SessionStore;

use super::restore::{
    FrameScheduler, MountFlag, RestoreOutcome, RestorePolicy, Viewport, restore_offset,
};

pub const DEFAULT_ROUTE_SCROLL_KEY: &str = "peja-route-scroll-v1";

pub type RouteOffsets = BTreeMap<String, u32>;

pub struct RouteScrollKeeper {
    store: Arc<dyn SessionStore>,
    storage_key: String,
    excluded_prefixes: Vec<String>,
    policy: RestorePolicy,
}

impl RouteScrollKeeper {
    pub fn new(
        store: Arc<dyn SessionStore>,
        storage_key: impl Into<String>,
        excluded_prefixes: Vec<String>,
        policy: RestorePolicy,
    ) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            excluded_prefixes,
            policy,
        }
    }

    /// Routes that manage their own scroller are left alone.
    pub fn is_excluded(&self, route: &RouteKey) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| route.starts_with(prefix))
    }

    /// Current persisted map. Missing or unreadable data reads as empty.
    /// Entries are decoded one by one so a single odd value (a fractional
    /// `scrollY`, a string) only loses that route.
    pub fn offsets(&self) -> RouteOffsets {
        match self.store.read_json(&self.storage_key) {
            Ok(Some(Value::Object(entries))) => entries
                .into_iter()
                .filter_map(|(route, value)| {
                    let offset = decode_offset(&value);
                    if offset.is_none() {
                        debug!(
                            storage_key = %self.storage_key,
                            route = %route,
                            "Skipping non-numeric route scroll entry"
                        );
                    }
                    offset.map(|offset| (route, offset))
                })
                .collect(),
            Ok(Some(_)) => {
                debug!(
                    storage_key = %self.storage_key,
                    "Discarding malformed route scroll map"
                );
                RouteOffsets::new()
            }
            Ok(None) => RouteOffsets::new(),
            Err(err) => {
                debug!(
                    storage_key = %self.storage_key,
                    error = %err,
                    "Route scroll map unreadable; starting empty"
                );
                RouteOffsets::new()
            }
        }
    }

    /// Persisted offset for `route`, 0 when unknown.
    pub fn target(&self, route: &RouteKey) -> u32 {
        self.offsets().get(route.as_str()).copied().unwrap_or(0)
    }

    /// Merge `offset` for `route` into the persisted map.
    pub fn save(&self, route: &RouteKey, offset: u32) {
        if self.is_excluded(route) {
            return;
        }

        let mut offsets = self.offsets();
        offsets.insert(route.as_str().to_string(), offset);

        let value = match serde_json::to_value(&offsets) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Failed to encode route scroll map");
                return;
            }
        };

        if let Err(err) = self.store.write_json(&self.storage_key, &value) {
            warn!(
                storage_key = %self.storage_key,
                route = %route,
                error = %err,
                "Route scroll save dropped"
            );
        }
    }

    /// Start tracking `route` on `viewport`. Returns `None` for excluded
    /// routes.
    pub fn mount(
        self: &Arc<Self>,
        route: RouteKey,
        viewport: Arc<dyn Viewport>,
        frames: Arc<dyn FrameScheduler>,
    ) -> Option<RouteScrollSession> {
        if self.is_excluded(&route) {
            debug!(route = %route, "Route excluded from scroll persistence");
            return None;
        }

        Some(RouteScrollSession {
            keeper: Arc::clone(self),
            route,
            viewport,
            frames,
            mount: MountFlag::new(),
        })
    }
}

/// Rounds and clamps any JSON number into a pixel offset.
fn decode_offset(value: &Value) -> Option<u32> {
    let offset = value.as_f64()?;
    if !offset.is_finite() {
        return Some(0);
    }
    Some(offset.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

/// One mounted route. Dropping the session is the unmount: it saves the
/// final offset and cancels any restore still retrying.
pub struct RouteScrollSession {
    keeper: Arc<RouteScrollKeeper>,
    route: RouteKey,
    viewport: Arc<dyn Viewport>,
    frames: Arc<dyn FrameScheduler>,
    mount: MountFlag,
}

impl RouteScrollSession {
    pub fn route(&self) -> &RouteKey {
        &self.route
    }

    pub fn mount_flag(&self) -> MountFlag {
        self.mount.clone()
    }

    pub async fn restore(&self) -> RestoreOutcome {
        let target = self.keeper.target(&self.route);
        restore_offset(
            target,
            self.viewport.as_ref(),
            self.frames.as_ref(),
            self.keeper.policy,
            &self.mount,
        )
        .await
    }

    /// Scroll event handler.
    pub fn on_scroll(&self) {
        self.keeper.save(&self.route, self.viewport.scroll_offset());
    }
}

impl Drop for RouteScrollSession {
    fn drop(&mut self) {
        self.mount.unmount();
        self.keeper.save(&self.route, self.viewport.scroll_offset());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infra::session_store::MemorySessionStore;
    use crate::navigation::restore::testing::GrowingDocument;

    fn keeper(store: Arc<MemorySessionStore>) -> Arc<RouteScrollKeeper> {
        Arc::new(RouteScrollKeeper::new(
            store,
            DEFAULT_ROUTE_SCROLL_KEY,
            vec!["/watch".to_string()],
            RestorePolicy::default(),
        ))
    }

    #[test]
    fn saves_merge_instead_of_clobbering() {
        let store = Arc::new(MemorySessionStore::new());
        let keeper = keeper(store.clone());

        keeper.save(&RouteKey::from("/"), 300);
        keeper.save(&RouteKey::from("/search?q=fire"), 90);
        keeper.save(&RouteKey::from("/"), 320);

        let stored = store
            .read_json(DEFAULT_ROUTE_SCROLL_KEY)
            .expect("readable")
            .expect("present");
        assert_eq!(stored, json!({ "/": 320, "/search?q=fire": 90 }));
    }

    #[test]
    fn corrupt_map_reads_as_empty_and_is_replaced() {
        let store = Arc::new(MemorySessionStore::new());
        store.insert_raw(DEFAULT_ROUTE_SCROLL_KEY, "{{{");
        let keeper = keeper(store.clone());

        assert!(keeper.offsets().is_empty());
        keeper.save(&RouteKey::from("/map"), 12);
        assert_eq!(keeper.target(&RouteKey::from("/map")), 12);
    }

    #[test]
    fn wrong_shape_reads_as_empty() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .write_json(DEFAULT_ROUTE_SCROLL_KEY, &json!(["not", "a", "map"]))
            .expect("write");
        assert!(keeper(store).offsets().is_empty());
    }

    #[test]
    fn odd_entries_do_not_wipe_the_map() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .write_json(
                DEFAULT_ROUTE_SCROLL_KEY,
                &json!({ "/": 12.5, "/search?q=fire": 300, "/map": -40, "/me": "top" }),
            )
            .expect("write");
        let keeper = keeper(store.clone());

        assert_eq!(keeper.target(&RouteKey::from("/search?q=fire")), 300);
        assert_eq!(keeper.target(&RouteKey::from("/")), 13);
        assert_eq!(keeper.target(&RouteKey::from("/map")), 0);

        keeper.save(&RouteKey::from("/notifications"), 10);
        let stored = store
            .read_json(DEFAULT_ROUTE_SCROLL_KEY)
            .expect("readable")
            .expect("present");
        assert_eq!(
            stored,
            json!({ "/": 13, "/map": 0, "/notifications": 10, "/search?q=fire": 300 })
        );
    }

    #[test]
    fn quota_failure_is_swallowed() {
        let store = Arc::new(MemorySessionStore::with_quota(8));
        let keeper = keeper(store.clone());
        keeper.save(&RouteKey::from("/notifications"), 100);
        assert_eq!(keeper.target(&RouteKey::from("/notifications")), 0);
    }

    #[test]
    fn excluded_routes_are_ignored() {
        let store = Arc::new(MemorySessionStore::new());
        let keeper = keeper(store.clone());
        keeper.save(&RouteKey::from("/watch?v=1"), 500);
        assert!(store.raw(DEFAULT_ROUTE_SCROLL_KEY).is_none());

        let doc = Arc::new(GrowingDocument::at(0));
        assert!(
            keeper
                .mount(RouteKey::from("/watch"), doc.clone(), doc)
                .is_none()
        );
    }

    #[tokio::test]
    async fn session_restores_and_saves_on_unmount() {
        let store = Arc::new(MemorySessionStore::new());
        let keeper = keeper(store.clone());
        keeper.save(&RouteKey::from("/profile?tab=posts"), 640);

        let doc = Arc::new(GrowingDocument::new(100, 300, u32::MAX));
        let session = keeper
            .mount(RouteKey::from("/profile?tab=posts"), doc.clone(), doc.clone())
            .expect("tracked route");

        let outcome = session.restore().await;
        assert!(matches!(outcome, RestoreOutcome::Settled { .. }));

        doc.scroll_to(900);
        session.on_scroll();
        assert_eq!(keeper.target(&RouteKey::from("/profile?tab=posts")), 900);

        let flag = session.mount_flag();
        doc.scroll_to(950);
        drop(session);
        assert!(!flag.is_mounted());
        assert_eq!(keeper.target(&RouteKey::from("/profile?tab=posts")), 950);
    }
}
