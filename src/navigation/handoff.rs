//! Time-boxed playback handoff between two surfaces showing the same media.
//!
//! The inline player writes a [`HandoffRecord`] when the user expands it; the
//! full-screen player reads it on mount. On close the full-screen player
//! writes a [`ReturnRecord`] which the inline player picks up. Both slots hold
//! a single record and expire lazily on read: there is no background timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use crate::cache::lock::mutex_lock;
use crate::infra::clock::Clock;

const SOURCE: &str = "navigation::handoff";
const METRIC_HANDOFF_EXPIRED_TOTAL: &str = "navcache_handoff_expired_total";

pub const DEFAULT_HANDOFF_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub struct HandoffRecord {
    pub media_ref: String,
    /// Playback position in seconds.
    pub position: f64,
    /// Opaque still frame shown while the receiving player buffers.
    pub poster_snapshot: Option<String>,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRecord {
    pub media_ref: String,
    pub position: f64,
    pub timestamp: OffsetDateTime,
}

pub struct HandoffChannel {
    clock: Arc<dyn Clock>,
    ttl: time::Duration,
    handoff: Mutex<Option<HandoffRecord>>,
    returning: Mutex<Option<ReturnRecord>>,
}

impl HandoffChannel {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl: time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX),
            handoff: Mutex::new(None),
            returning: Mutex::new(None),
        }
    }

    fn is_expired(&self, timestamp: OffsetDateTime) -> bool {
        self.clock.now() - timestamp > self.ttl
    }

    /// Record an outgoing handoff, replacing any pending one.
    pub fn begin_expand(&self, media_ref: &str, position: f64, poster_snapshot: Option<String>) {
        let record = HandoffRecord {
            media_ref: media_ref.to_string(),
            position: sanitize_position(position),
            poster_snapshot,
            timestamp: self.clock.now(),
        };
        *mutex_lock(&self.handoff, SOURCE, "begin_expand") = Some(record);
    }

    /// The pending handoff, if it is still within its validity window. An
    /// expired record is cleared by this read.
    pub fn get_handoff(&self) -> Option<HandoffRecord> {
        let mut slot = mutex_lock(&self.handoff, SOURCE, "get_handoff");
        let record = slot.as_ref()?;
        if self.is_expired(record.timestamp) {
            debug!(media_ref = %record.media_ref, "Handoff expired before it was read");
            counter!(METRIC_HANDOFF_EXPIRED_TOTAL, "slot" => "handoff").increment(1);
            *slot = None;
            return None;
        }
        Some(record.clone())
    }

    pub fn clear_handoff(&self) {
        *mutex_lock(&self.handoff, SOURCE, "clear_handoff") = None;
    }

    /// Record the position a closing surface reached, replacing any pending
    /// return record.
    pub fn return_time(&self, media_ref: &str, position: f64) {
        let record = ReturnRecord {
            media_ref: media_ref.to_string(),
            position: sanitize_position(position),
            timestamp: self.clock.now(),
        };
        *mutex_lock(&self.returning, SOURCE, "return_time") = Some(record);
    }

    /// Resume position for `media_ref`.
    ///
    /// A read for a different media element returns `None` and leaves the
    /// pending record in place for its owner.
    pub fn get_return_time(&self, media_ref: &str) -> Option<f64> {
        let mut slot = mutex_lock(&self.returning, SOURCE, "get_return_time");
        let record = slot.as_ref()?;
        if self.is_expired(record.timestamp) {
            debug!(media_ref = %record.media_ref, "Return position expired before it was read");
            counter!(METRIC_HANDOFF_EXPIRED_TOTAL, "slot" => "return").increment(1);
            *slot = None;
            return None;
        }
        (record.media_ref == media_ref).then_some(record.position)
    }

    /// Clear the pending return record if it belongs to `media_ref`.
    pub fn clear_return_time(&self, media_ref: &str) {
        let mut slot = mutex_lock(&self.returning, SOURCE, "clear_return_time");
        if slot
            .as_ref()
            .is_some_and(|record| record.media_ref == media_ref)
        {
            *slot = None;
        }
    }

    /// Drop both slots.
    pub fn reset(&self) {
        self.clear_handoff();
        *mutex_lock(&self.returning, SOURCE, "reset") = None;
    }
}

fn sanitize_position(position: f64) -> f64 {
    if position.is_finite() && position > 0.0 {
        position
    } else {
        0.0
    }
}
