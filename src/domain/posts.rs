//! Incident posts as they appear in cached feeds.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Anything that can live in a cached feed.
///
/// Feeds only need a stable identity to support cross-feed removal.
pub trait FeedItem {
    fn item_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Live,
    Resolved,
    Archived,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMedia {
    pub id: Uuid,
    pub url: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub location: GeoPoint,
    #[serde(default)]
    pub address: Option<String>,
    pub is_anonymous: bool,
    pub status: PostStatus,
    pub is_sensitive: bool,
    pub confirmations: u32,
    pub views: u32,
    #[serde(default)]
    pub comment_count: Option<u32>,
    #[serde(default)]
    pub report_count: Option<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub media: Vec<PostMedia>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FeedItem for Post {
    fn item_id(&self) -> Uuid {
        self.id
    }
}
