//! Domain records carried by the caches.

pub mod messages;
pub mod posts;
pub mod routes;
