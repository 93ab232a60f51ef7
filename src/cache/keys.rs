//! Cache key conventions shared by producers and invalidators.
//!
//! Keys are plain strings; hierarchy is expressed with `:` so that prefix
//! invalidation can drop a whole scope at once.

use uuid::Uuid;

pub const HOME_FEED: &str = "home";
pub const MAP_POSTS_FEED: &str = "map:posts";
pub const MAP_SOS_FEED: &str = "map:sos";

/// Posts authored by one user.
pub fn profile_posts_feed(user_id: Uuid) -> String {
    format!("{}:posts", profile_scope(user_id))
}

/// Every page entry belonging to one user's profile.
pub fn profile_scope(user_id: Uuid) -> String {
    format!("profile:{user_id}")
}

/// Every page entry derived from one post (detail, comments, confirmations).
pub fn post_scope(post_id: Uuid) -> String {
    format!("post:{post_id}")
}

/// Search results, normalised so that equivalent queries share a feed.
pub fn search_feed(query: &str) -> String {
    format!("search:{}", query.trim().to_lowercase())
}
