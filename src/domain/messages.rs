//! Direct-message records held by the chat cache.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Media,
    Voice,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
    pub content_type: ContentType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub is_deleted: bool,
}

/// One row of the conversation list, as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub other_user_id: Uuid,
    #[serde(default)]
    pub other_user_name: Option<String>,
    #[serde(default)]
    pub last_message_text: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub last_message_sender_id: Option<Uuid>,
    #[serde(default)]
    pub last_message_seen: bool,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial server-side update of a conversation row. Absent fields keep
/// their cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPatch {
    pub id: Uuid,
    #[serde(default)]
    pub last_message_text: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub last_message_sender_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// A participant advanced their read marker in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub last_read_at: OffsetDateTime,
}
