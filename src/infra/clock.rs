//! Time source used for every cache timestamp.
//!
//! Stores never call `OffsetDateTime::now_utc()` directly; they read the
//! injected [`Clock`] so staleness and expiry can be driven from tests.

use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "infra::clock";

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Starts at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = mutex_lock(&self.now, SOURCE, "advance");
        *now += by;
    }

    pub fn set(&self, at: OffsetDateTime) {
        *mutex_lock(&self.now, SOURCE, "set") = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *mutex_lock(&self.now, SOURCE, "now")
    }
}

/// Milliseconds elapsed from `since` to `now`, clamped at zero.
pub fn elapsed_ms(since: OffsetDateTime, now: OffsetDateTime) -> u64 {
    let millis = (now - since).whole_milliseconds();
    u64::try_from(millis.max(0)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_epoch();
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(elapsed_ms(start, clock.now()), 1500);
    }

    #[test]
    fn elapsed_clamps_backwards_time() {
        let clock = ManualClock::at_epoch();
        let later = clock.now() + Duration::from_secs(5);
        assert_eq!(elapsed_ms(later, clock.now()), 0);
    }
}
