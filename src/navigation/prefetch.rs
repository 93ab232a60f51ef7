use std::sync::Arc;

use tracing::debug;

use super::reconciler::AppRouter;

/// Core tabs first, then the sheets users open most often.
pub const DEFAULT_PREFETCH_ROUTES: &[&str] = &[
    "/",
    "/map",
    "/create",
    "/profile",
    "/search",
    "/notifications",
    "/settings",
    "/emergency-contacts",
    "/become-guardian",
    "/help",
    "/privacy",
    "/terms",
];

/// Warms the router's route cache once at startup.
pub struct RoutePrefetcher {
    router: Arc<dyn AppRouter>,
    routes: Vec<String>,
}

impl RoutePrefetcher {
    pub fn new(router: Arc<dyn AppRouter>, routes: Vec<String>) -> Self {
        Self { router, routes }
    }

    /// Returns the number of routes requested.
    pub fn prefetch_all(&self) -> usize {
        for route in &self.routes {
            self.router.prefetch(route);
        }
        debug!(count = self.routes.len(), "Prefetched core routes");
        self.routes.len()
    }
}
