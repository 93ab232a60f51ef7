//! Cross-view navigation state.
//!
//! - [`handoff`]: one-shot playback handoff between two media surfaces
//! - [`scroll`]: per-view scroll offsets with bounded restore
//! - [`route_scroll`]: route-level scroll map persisted across reloads
//! - [`reconciler`]: router/browser URL reconciliation after back/forward
//! - [`prefetch`]: startup route prefetching

mod config;
pub mod handoff;
pub mod prefetch;
pub mod reconciler;
pub mod restore;
pub mod route_scroll;
pub mod scroll;

pub use config::NavigationConfig;
pub use handoff::{HandoffChannel, HandoffRecord, ReturnRecord};
pub use prefetch::RoutePrefetcher;
pub use reconciler::{
    AppRouter, BrowserHistory, HistoryReconciler, NavigateOptions, ReconcileOutcome,
    ReconcileState, ReconcilerConfig,
};
pub use restore::{
    FrameScheduler, ImmediateFrames, MountFlag, RestoreOutcome, RestorePolicy, TokioFrames,
    Viewport,
};
pub use route_scroll::{RouteScrollKeeper, RouteScrollSession};
pub use scroll::{ScrollEntry, ScrollPositionStore};
