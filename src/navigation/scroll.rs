//! In-memory scroll position store keyed by logical view.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use time::OffsetDateTime;

use crate::cache::lock::{rw_read, rw_write};
use crate::infra::clock::Clock;

use super::restore::{
    FrameScheduler, MountFlag, RestoreOutcome, RestorePolicy, Viewport, restore_offset,
};

const SOURCE: &str = "navigation::scroll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEntry {
    pub offset: u32,
    pub timestamp: OffsetDateTime,
}

/// Last-known vertical offset per view key.
pub struct ScrollPositionStore {
    clock: Arc<dyn Clock>,
    policy: RestorePolicy,
    /// Grows with visited routes until `clear_all`.
    entries: RwLock<HashMap<String, ScrollEntry>>,
}

impl ScrollPositionStore {
    pub fn new(clock: Arc<dyn Clock>, policy: RestorePolicy) -> Self {
        Self {
            clock,
            policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record the offset for `key`. Called from every scroll event.
    pub fn save(&self, key: &str, offset: u32) {
        let entry = ScrollEntry {
            offset,
            timestamp: self.clock.now(),
        };
        rw_write(&self.entries, SOURCE, "save").insert(key.to_string(), entry);
    }

    pub fn entry(&self, key: &str) -> Option<ScrollEntry> {
        rw_read(&self.entries, SOURCE, "entry").get(key).copied()
    }

    /// Saved offset, or 0 when nothing was recorded.
    pub fn offset(&self, key: &str) -> u32 {
        self.entry(key).map_or(0, |entry| entry.offset)
    }

    pub fn clear(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "clear").remove(key);
    }

    pub fn clear_all(&self) {
        rw_write(&self.entries, SOURCE, "clear_all").clear();
    }

    pub fn policy(&self) -> RestorePolicy {
        self.policy
    }

    /// Bring `viewport` back to the offset saved for `key`.
    pub async fn restore(
        &self,
        key: &str,
        viewport: &dyn Viewport,
        frames: &dyn FrameScheduler,
        mount: &MountFlag,
    ) -> RestoreOutcome {
        let target = self.offset(key);
        restore_offset(target, viewport, frames, self.policy, mount).await
    }
}
