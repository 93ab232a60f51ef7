//! Bounded retry-until-stable scroll restoration.
//!
//! Content that determines document height may still be rendering when a
//! view asks for its old offset back, so a single `scroll_to` is not enough.
//! [`restore_offset`] sets the offset, waits for the next frame, checks how
//! close it landed, and tries again up to [`RestorePolicy::max_attempts`]
//! times. Giving up is a normal outcome, not an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::debug;

const METRIC_SCROLL_RESTORE_TOTAL: &str = "navcache_scroll_restore_total";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;
pub const DEFAULT_TOLERANCE_PX: u32 = 2;
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePolicy {
    pub max_attempts: u32,
    pub tolerance_px: u32,
}

impl Default for RestorePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            tolerance_px: DEFAULT_TOLERANCE_PX,
        }
    }
}

/// The scrollable surface a view lives in.
pub trait Viewport: Send + Sync {
    /// Current vertical offset in pixels.
    fn scroll_offset(&self) -> u32;
    /// Request a vertical offset. The surface may clamp it.
    fn scroll_to(&self, offset: u32);
}

/// Yields until the next paint opportunity.
#[async_trait]
pub trait FrameScheduler: Send + Sync {
    async fn next_frame(&self);
}

/// Frame scheduler backed by a tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioFrames {
    interval: Duration,
}

impl TokioFrames {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for TokioFrames {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

#[async_trait]
impl FrameScheduler for TokioFrames {
    async fn next_frame(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Frame scheduler for headless use: a cooperative yield and nothing more.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateFrames;

#[async_trait]
impl FrameScheduler for ImmediateFrames {
    async fn next_frame(&self) {
        tokio::task::yield_now().await;
    }
}

/// Liveness flag shared between a mounted view and its scheduled work.
///
/// Clones observe the same flag. Once [`MountFlag::unmount`] is called every
/// pending restore stops before its next attempt.
#[derive(Debug, Clone)]
pub struct MountFlag {
    mounted: Arc<AtomicBool>,
}

impl MountFlag {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

impl Default for MountFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The viewport landed within tolerance of the target.
    Settled { attempts: u32 },
    /// The retry budget ran out; the viewport stays wherever it got to.
    GaveUp { attempts: u32, achieved: u32 },
    /// The view unmounted before the restore finished.
    Cancelled { attempts: u32 },
}

impl RestoreOutcome {
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Settled { attempts }
            | Self::GaveUp { attempts, .. }
            | Self::Cancelled { attempts } => attempts,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Settled { .. } => "settled",
            Self::GaveUp { .. } => "gave_up",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Drive `viewport` towards `target` until it sticks, the budget runs out, or
/// `mount` goes away.
pub async fn restore_offset(
    target: u32,
    viewport: &dyn Viewport,
    frames: &dyn FrameScheduler,
    policy: RestorePolicy,
    mount: &MountFlag,
) -> RestoreOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    let outcome = loop {
        if !mount.is_mounted() {
            break RestoreOutcome::Cancelled { attempts };
        }

        attempts += 1;
        viewport.scroll_to(target);
        frames.next_frame().await;

        if !mount.is_mounted() {
            break RestoreOutcome::Cancelled { attempts };
        }

        let achieved = viewport.scroll_offset();
        if achieved.abs_diff(target) <= policy.tolerance_px {
            break RestoreOutcome::Settled { attempts };
        }
        if attempts >= max_attempts {
            break RestoreOutcome::GaveUp { attempts, achieved };
        }
    };

    debug!(target_offset = target, outcome = ?outcome, "Scroll restore finished");
    counter!(METRIC_SCROLL_RESTORE_TOTAL, "outcome" => outcome.label()).increment(1);
    outcome
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// A document whose scrollable height grows by `growth` pixels per frame,
    /// like a list whose items are still rendering.
    #[derive(Debug)]
    pub(crate) struct GrowingDocument {
        state: Mutex<(u32, u32)>,
        growth: u32,
        cap: u32,
    }

    impl GrowingDocument {
        pub(crate) fn new(initial_height: u32, growth: u32, cap: u32) -> Self {
            Self {
                state: Mutex::new((0, initial_height)),
                growth,
                cap,
            }
        }

        pub(crate) fn at(offset: u32) -> Self {
            Self {
                state: Mutex::new((offset, u32::MAX)),
                growth: 0,
                cap: u32::MAX,
            }
        }
    }

    impl Viewport for GrowingDocument {
        fn scroll_offset(&self) -> u32 {
            self.state.lock().unwrap().0
        }

        fn scroll_to(&self, offset: u32) {
            let mut state = self.state.lock().unwrap();
            state.0 = offset.min(state.1);
        }
    }

    #[async_trait]
    impl FrameScheduler for GrowingDocument {
        async fn next_frame(&self) {
            let mut state = self.state.lock().unwrap();
            state.1 = state.1.saturating_add(self.growth).min(self.cap);
        }
    }
}
