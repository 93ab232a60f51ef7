//! navcache: client-side page, feed and navigation-state caches.
//!
//! The stores in this crate keep a list/detail navigation flow instantaneous:
//! fetched lists and page data survive remounts, scroll positions survive
//! navigation (and reloads, for the route-level variant), playback position is
//! handed between two surfaces showing the same media, and the router is kept
//! in step with the browser after native back/forward navigation.
//!
//! [`context::NavContext`] is the root provider that owns one instance of each
//! store for the lifetime of a session.

pub mod cache;
pub mod config;
pub mod context;
pub mod domain;
pub mod infra;
pub mod navigation;
