//! Conversation list and recent-message cache for the chat views.
//!
//! Unread counters have exactly two writers: an incoming message from the
//! other participant in a conversation that is not being viewed increments
//! it, and [`MessageCache::set_active`] / [`MessageCache::clear_unread`]
//! reset it. Nothing else touches the counter.
//!
//! The list and each conversation's recent history are mirrored to the
//! session store so a reload can paint them before the first fetch returns.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::messages::{ContentType, Conversation, ConversationPatch, Message, ReadReceipt};
use crate::infra::clock::Clock;
use crate::infra::session_store::{SessionStore, SessionStoreError};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::messages";
const METRIC_MIRROR_FAILED_TOTAL: &str = "navcache_chat_mirror_failed_total";

pub const CONVERSATIONS_STORAGE_KEY: &str = "peja-msg-v2";
const HISTORY_STORAGE_PREFIX: &str = "peja-chat-cache-";
const PREVIEW_CHARS: usize = 100;

pub fn history_storage_key(conversation_id: Uuid) -> String {
    format!("{HISTORY_STORAGE_PREFIX}{conversation_id}")
}

/// What an incoming message did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Not addressed to a known conversation, or no viewer signed in.
    Ignored,
    /// Recorded in history only; the conversation is not listed yet.
    Unlisted,
    /// The listed conversation already shows a newer or equal message.
    Stale,
    /// The conversation row now previews this message.
    Applied { unread_incremented: bool },
}

#[derive(Debug, Default)]
struct ChatState {
    viewer: Option<Uuid>,
    active: Option<Uuid>,
    conversations: Vec<Conversation>,
}

impl ChatState {
    fn find_mut(&mut self, id: Uuid) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|conversation| conversation.id == id)
    }

    fn sort(&mut self) {
        // Stable: rows without a last message sink to the bottom in their
        // existing order.
        self.conversations
            .sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    }
}

pub struct MessageCache {
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    history_limit: usize,
    state: RwLock<ChatState>,
    /// One bounded history per conversation opened this session. The map
    /// itself only shrinks on `clear`.
    histories: RwLock<HashMap<Uuid, Vec<Message>>>,
}

impl MessageCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            clock,
            store,
            history_limit: config.message_history_limit_non_zero().get(),
            state: RwLock::new(ChatState::default()),
            histories: RwLock::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Conversation list
    // ========================================================================

    /// Replace the list with a fresh fetch result.
    pub fn replace_conversations(&self, conversations: Vec<Conversation>) {
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "replace_conversations");
            state.conversations = conversations;
            if let Some(active) = state.active
                && let Some(conversation) = state.find_mut(active)
            {
                conversation.unread_count = 0;
            }
            state.sort();
            state.conversations.clone()
        };
        self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
    }

    /// Conversations, most recent activity first.
    pub fn conversations(&self) -> Vec<Conversation> {
        rw_read(&self.state, SOURCE, "conversations")
            .conversations
            .clone()
    }

    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        rw_read(&self.state, SOURCE, "conversation")
            .conversations
            .iter()
            .find(|conversation| conversation.id == id)
            .cloned()
    }

    pub fn total_unread(&self) -> u32 {
        rw_read(&self.state, SOURCE, "total_unread")
            .conversations
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    pub fn set_viewer(&self, viewer: Option<Uuid>) {
        rw_write(&self.state, SOURCE, "set_viewer").viewer = viewer;
    }

    pub fn viewer(&self) -> Option<Uuid> {
        rw_read(&self.state, SOURCE, "viewer").viewer
    }

    /// Switch the conversation on screen. Entering a conversation clears
    /// its unread count.
    pub fn set_active(&self, id: Option<Uuid>) {
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "set_active");
            state.active = id;
            let cleared = match id.and_then(|id| {
                state.conversations.iter().position(|conversation| conversation.id == id)
            }) {
                Some(index) => {
                    let conversation = &mut state.conversations[index];
                    let had_unread = conversation.unread_count > 0;
                    conversation.unread_count = 0;
                    had_unread
                }
                None => false,
            };
            cleared.then(|| state.conversations.clone())
        };
        if let Some(snapshot) = snapshot {
            self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
        }
    }

    pub fn active(&self) -> Option<Uuid> {
        rw_read(&self.state, SOURCE, "active").active
    }

    /// Returns `true` when the conversation had unread messages.
    pub fn clear_unread(&self, id: Uuid) -> bool {
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "clear_unread");
            match state.find_mut(id) {
                Some(conversation) if conversation.unread_count > 0 => {
                    conversation.unread_count = 0;
                    Some(state.conversations.clone())
                }
                _ => None,
            }
        };
        let cleared = snapshot.is_some();
        if let Some(snapshot) = snapshot {
            self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
        }
        cleared
    }

    /// Optimistic preview after the viewer sends a message.
    pub fn update_last_message(&self, id: Uuid, text: &str, sender_id: Uuid) {
        let now = self.clock.now();
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "update_last_message");
            let Some(conversation) = state.find_mut(id) else {
                return;
            };
            conversation.last_message_text = Some(text.to_string());
            conversation.last_message_at = Some(now);
            conversation.last_message_sender_id = Some(sender_id);
            conversation.last_message_seen = false;
            conversation.updated_at = now;
            state.sort();
            state.conversations.clone()
        };
        self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
    }

    // ========================================================================
    // Realtime events
    // ========================================================================

    pub fn apply_message_insert(&self, message: &Message) -> InsertOutcome {
        let (outcome, snapshot) = {
            let mut state = rw_write(&self.state, SOURCE, "apply_message_insert");
            let Some(viewer) = state.viewer else {
                return InsertOutcome::Ignored;
            };
            let from_viewer = message.sender_id == viewer;
            let viewing = state.active == Some(message.conversation_id);

            match state.find_mut(message.conversation_id) {
                None if !from_viewer => return InsertOutcome::Ignored,
                None => (InsertOutcome::Unlisted, None),
                Some(conversation)
                    if conversation
                        .last_message_at
                        .is_some_and(|last| last >= message.created_at) =>
                {
                    (InsertOutcome::Stale, None)
                }
                Some(conversation) => {
                    let unread_incremented = !from_viewer && !viewing;
                    if unread_incremented {
                        conversation.unread_count += 1;
                    }
                    conversation.last_message_text = Some(preview_text(message));
                    conversation.last_message_at = Some(message.created_at);
                    conversation.last_message_sender_id = Some(message.sender_id);
                    conversation.last_message_seen = false;
                    conversation.updated_at = message.created_at;
                    state.sort();
                    (
                        InsertOutcome::Applied { unread_incremented },
                        Some(state.conversations.clone()),
                    )
                }
            }
        };

        if let Some(snapshot) = snapshot {
            self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
        }
        self.push_history(message);
        debug!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            ?outcome,
            "Applied message insert"
        );
        outcome
    }

    /// Merge the present fields of a server-side row update. Unread counts
    /// are never changed here. Returns `false` for unknown conversations.
    pub fn apply_conversation_update(&self, patch: &ConversationPatch) -> bool {
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "apply_conversation_update");
            let Some(conversation) = state.find_mut(patch.id) else {
                return false;
            };
            if let Some(text) = &patch.last_message_text {
                conversation.last_message_text = Some(text.clone());
            }
            if let Some(at) = patch.last_message_at {
                conversation.last_message_at = Some(at);
            }
            if let Some(sender) = patch.last_message_sender_id {
                conversation.last_message_sender_id = Some(sender);
            }
            if let Some(updated_at) = patch.updated_at {
                conversation.updated_at = updated_at;
            }
            state.sort();
            state.conversations.clone()
        };
        self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
        true
    }

    /// The other participant advanced their read marker. Marks the viewer's
    /// own last message as seen when the marker is at or after it.
    pub fn apply_read_receipt(&self, receipt: &ReadReceipt) -> bool {
        let snapshot = {
            let mut state = rw_write(&self.state, SOURCE, "apply_read_receipt");
            let Some(viewer) = state.viewer else {
                return false;
            };
            if receipt.user_id == viewer {
                return false;
            }
            let Some(conversation) = state.find_mut(receipt.conversation_id) else {
                return false;
            };
            if conversation.last_message_sender_id != Some(viewer)
                || conversation.last_message_seen
            {
                return false;
            }
            match conversation.last_message_at {
                Some(last) if receipt.last_read_at >= last => {
                    conversation.last_message_seen = true;
                }
                _ => return false,
            }
            state.conversations.clone()
        };
        self.mirror(CONVERSATIONS_STORAGE_KEY, &snapshot);
        true
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Recent messages of a conversation, oldest first.
    pub fn history(&self, conversation_id: Uuid) -> Vec<Message> {
        rw_read(&self.histories, SOURCE, "history")
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    fn push_history(&self, message: &Message) {
        let snapshot = {
            let mut histories = rw_write(&self.histories, SOURCE, "push_history");
            let history = histories.entry(message.conversation_id).or_default();
            if history.iter().any(|existing| existing.id == message.id) {
                return;
            }
            history.push(message.clone());
            if history.len() > self.history_limit {
                let overflow = history.len() - self.history_limit;
                history.drain(..overflow);
            }
            history.clone()
        };
        self.mirror(&history_storage_key(message.conversation_id), &snapshot);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load the mirrored list and histories for instant display. Returns the
    /// number of conversations restored. Unreadable snapshots are skipped.
    pub fn restore_snapshot(&self) -> usize {
        let Some(mut conversations) =
            self.load::<Vec<Conversation>>(CONVERSATIONS_STORAGE_KEY)
        else {
            return 0;
        };
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

        let restored: HashMap<Uuid, Vec<Message>> = conversations
            .iter()
            .filter_map(|conversation| {
                let mut history =
                    self.load::<Vec<Message>>(&history_storage_key(conversation.id))?;
                if history.len() > self.history_limit {
                    history.drain(..history.len() - self.history_limit);
                }
                Some((conversation.id, history))
            })
            .collect();

        let count = conversations.len();
        rw_write(&self.state, SOURCE, "restore_snapshot").conversations = conversations;
        rw_write(&self.histories, SOURCE, "restore_snapshot").extend(restored);
        debug!(count, "Restored chat cache snapshot");
        count
    }

    /// Logout reset. The mirrored list is emptied so the next session does
    /// not paint someone else's conversations.
    pub fn clear(&self) {
        *rw_write(&self.state, SOURCE, "clear") = ChatState::default();
        rw_write(&self.histories, SOURCE, "clear").clear();
        self.mirror(CONVERSATIONS_STORAGE_KEY, &Vec::<Conversation>::new());
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self.store.read_json(key).and_then(|value| {
            value
                .map(serde_json::from_value::<T>)
                .transpose()
                .map_err(SessionStoreError::from)
        });
        match result {
            Ok(value) => value,
            Err(error) => {
                debug!(key, %error, "Ignoring unreadable chat snapshot");
                None
            }
        }
    }

    fn mirror<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_value(value)
            .map_err(SessionStoreError::from)
            .and_then(|json| self.store.write_json(key, &json));
        if let Err(error) = result {
            warn!(key, %error, "Failed to mirror chat cache to session storage");
            counter!(METRIC_MIRROR_FAILED_TOTAL).increment(1);
        }
    }
}

fn preview_text(message: &Message) -> String {
    match message.content.as_deref() {
        Some(content) if !content.is_empty() => content.chars().take(PREVIEW_CHARS).collect(),
        _ if message.content_type == ContentType::Media => "Sent an attachment".to_string(),
        _ => "New message".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::OffsetDateTime;

    use super::*;
    use crate::infra::clock::ManualClock;
    use crate::infra::session_store::MemorySessionStore;

    const VIEWER: Uuid = Uuid::from_u128(1);
    const FRIEND: Uuid = Uuid::from_u128(2);
    const CONV_A: Uuid = Uuid::from_u128(10);
    const CONV_B: Uuid = Uuid::from_u128(11);

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(secs)
    }

    fn conversation(id: Uuid, last_at: Option<i64>) -> Conversation {
        Conversation {
            id,
            other_user_id: FRIEND,
            other_user_name: Some("Ada".to_string()),
            last_message_text: None,
            last_message_at: last_at.map(at),
            last_message_sender_id: None,
            last_message_seen: false,
            unread_count: 0,
            updated_at: at(0),
        }
    }

    fn message(n: u128, conversation_id: Uuid, sender_id: Uuid, secs: i64) -> Message {
        Message {
            id: Uuid::from_u128(1000 + n),
            conversation_id,
            sender_id,
            content: Some(format!("hello {n}")),
            content_type: ContentType::Text,
            created_at: at(secs),
            is_deleted: false,
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<MemorySessionStore>,
        cache: MessageCache,
    }

    fn fixture_with(config: CacheConfig) -> Fixture {
        let clock = Arc::new(ManualClock::at_epoch());
        let store = Arc::new(MemorySessionStore::new());
        let cache = MessageCache::new(&config, clock.clone(), store.clone());
        cache.set_viewer(Some(VIEWER));
        cache.replace_conversations(vec![
            conversation(CONV_A, Some(10)),
            conversation(CONV_B, Some(20)),
        ]);
        Fixture {
            clock,
            store,
            cache,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CacheConfig::default())
    }

    #[test]
    fn list_is_sorted_newest_first() {
        let f = fixture();
        let ids: Vec<Uuid> = f.cache.conversations().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CONV_B, CONV_A]);
    }

    #[test]
    fn message_from_other_in_background_increments_unread() {
        let f = fixture();
        let outcome = f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));

        assert_eq!(outcome, InsertOutcome::Applied { unread_incremented: true });
        let conv = f.cache.conversation(CONV_A).expect("listed");
        assert_eq!(conv.unread_count, 1);
        assert_eq!(conv.last_message_text.as_deref(), Some("hello 1"));
        assert_eq!(f.cache.conversations()[0].id, CONV_A);
    }

    #[test]
    fn viewed_or_own_messages_do_not_increment_unread() {
        let f = fixture();
        f.cache.set_active(Some(CONV_A));
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));
        f.cache.apply_message_insert(&message(2, CONV_B, VIEWER, 40));

        assert_eq!(f.cache.total_unread(), 0);
    }

    #[test]
    fn stale_insert_is_deduplicated() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_B, FRIEND, 30));
        let outcome = f.cache.apply_message_insert(&message(2, CONV_B, FRIEND, 30));

        assert_eq!(outcome, InsertOutcome::Stale);
        assert_eq!(f.cache.conversation(CONV_B).expect("listed").unread_count, 1);
    }

    #[test]
    fn unknown_conversation_is_ignored_unless_sent_by_viewer() {
        let f = fixture();
        let stranger = Uuid::from_u128(99);
        assert_eq!(
            f.cache.apply_message_insert(&message(1, stranger, FRIEND, 30)),
            InsertOutcome::Ignored
        );
        assert!(f.cache.history(stranger).is_empty());

        assert_eq!(
            f.cache.apply_message_insert(&message(2, stranger, VIEWER, 31)),
            InsertOutcome::Unlisted
        );
        assert_eq!(f.cache.history(stranger).len(), 1);
    }

    #[test]
    fn no_viewer_means_nothing_applies() {
        let f = fixture();
        f.cache.set_viewer(None);
        assert_eq!(
            f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30)),
            InsertOutcome::Ignored
        );
    }

    #[test]
    fn preview_falls_back_for_attachments() {
        let mut media = message(1, CONV_A, FRIEND, 30);
        media.content = None;
        media.content_type = ContentType::Media;
        assert_eq!(preview_text(&media), "Sent an attachment");

        let mut voice = message(2, CONV_A, FRIEND, 30);
        voice.content = Some(String::new());
        voice.content_type = ContentType::Voice;
        assert_eq!(preview_text(&voice), "New message");

        let mut long = message(3, CONV_A, FRIEND, 30);
        long.content = Some("é".repeat(150));
        assert_eq!(preview_text(&long).chars().count(), 100);
    }

    #[test]
    fn entering_conversation_clears_unread() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));
        f.cache.apply_message_insert(&message(2, CONV_A, FRIEND, 31));
        assert_eq!(f.cache.total_unread(), 2);

        f.cache.set_active(Some(CONV_A));
        assert_eq!(f.cache.active(), Some(CONV_A));
        assert_eq!(f.cache.total_unread(), 0);
    }

    #[test]
    fn clear_unread_reports_change() {
        let f = fixture();
        assert!(!f.cache.clear_unread(CONV_A));
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));
        assert!(f.cache.clear_unread(CONV_A));
    }

    #[test]
    fn conversation_update_merges_without_touching_unread() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));

        let applied = f.cache.apply_conversation_update(&ConversationPatch {
            id: CONV_A,
            last_message_text: Some("edited".to_string()),
            last_message_at: None,
            last_message_sender_id: None,
            updated_at: Some(at(50)),
        });

        assert!(applied);
        let conv = f.cache.conversation(CONV_A).expect("listed");
        assert_eq!(conv.last_message_text.as_deref(), Some("edited"));
        assert_eq!(conv.last_message_at, Some(at(30)));
        assert_eq!(conv.updated_at, at(50));
        assert_eq!(conv.unread_count, 1);
    }

    #[test]
    fn read_receipt_marks_own_message_seen() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_A, VIEWER, 30));

        let early = ReadReceipt {
            conversation_id: CONV_A,
            user_id: FRIEND,
            last_read_at: at(29),
        };
        assert!(!f.cache.apply_read_receipt(&early));

        let own = ReadReceipt {
            user_id: VIEWER,
            last_read_at: at(40),
            ..early.clone()
        };
        assert!(!f.cache.apply_read_receipt(&own));

        let exact = ReadReceipt {
            last_read_at: at(30),
            ..early
        };
        assert!(f.cache.apply_read_receipt(&exact));
        assert!(f.cache.conversation(CONV_A).expect("listed").last_message_seen);
    }

    #[test]
    fn read_receipt_survives_reload() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_A, VIEWER, 30));
        assert!(f.cache.apply_read_receipt(&ReadReceipt {
            conversation_id: CONV_A,
            user_id: FRIEND,
            last_read_at: at(31),
        }));

        let clock = Arc::new(ManualClock::at_epoch());
        let reloaded = MessageCache::new(&CacheConfig::default(), clock, f.store.clone());
        reloaded.restore_snapshot();
        assert!(reloaded.conversation(CONV_A).expect("listed").last_message_seen);
    }

    #[test]
    fn update_last_message_uses_clock() {
        let f = fixture();
        f.clock.advance(Duration::from_secs(100));
        f.cache.update_last_message(CONV_A, "on my way", VIEWER);

        let conv = f.cache.conversation(CONV_A).expect("listed");
        assert_eq!(conv.last_message_at, Some(f.clock.now()));
        assert_eq!(conv.last_message_sender_id, Some(VIEWER));
        assert_eq!(f.cache.conversations()[0].id, CONV_A);
    }

    #[test]
    fn history_is_bounded_and_deduplicated() {
        let f = fixture_with(CacheConfig {
            message_history_limit: 3,
            ..Default::default()
        });
        for n in 0..5 {
            f.cache.apply_message_insert(&message(n, CONV_A, FRIEND, 30 + n as i64));
        }
        f.cache.apply_message_insert(&message(4, CONV_A, FRIEND, 34));

        let ids: Vec<Uuid> = f.cache.history(CONV_A).iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(1002), Uuid::from_u128(1003), Uuid::from_u128(1004)]
        );
    }

    #[test]
    fn snapshot_round_trips_through_session_store() {
        let f = fixture();
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));
        assert!(f.store.raw(CONVERSATIONS_STORAGE_KEY).is_some());
        assert!(f.store.raw(&history_storage_key(CONV_A)).is_some());

        let clock = Arc::new(ManualClock::at_epoch());
        let reloaded = MessageCache::new(&CacheConfig::default(), clock, f.store.clone());
        assert_eq!(reloaded.restore_snapshot(), 2);
        assert_eq!(reloaded.conversations(), f.cache.conversations());
        assert_eq!(reloaded.history(CONV_A), f.cache.history(CONV_A));
    }

    #[test]
    fn corrupt_snapshot_is_skipped() {
        let store = Arc::new(MemorySessionStore::new());
        store.insert_raw(CONVERSATIONS_STORAGE_KEY, "{not json");
        let cache = MessageCache::new(
            &CacheConfig::default(),
            Arc::new(ManualClock::at_epoch()),
            store,
        );
        assert_eq!(cache.restore_snapshot(), 0);
        assert!(cache.conversations().is_empty());
    }

    #[test]
    fn mirror_failures_are_swallowed() {
        let store = Arc::new(MemorySessionStore::with_quota(8));
        let cache = MessageCache::new(
            &CacheConfig::default(),
            Arc::new(ManualClock::at_epoch()),
            store.clone(),
        );
        cache.set_viewer(Some(VIEWER));
        cache.replace_conversations(vec![conversation(CONV_A, None)]);

        assert_eq!(cache.conversations().len(), 1);
        assert!(store.raw(CONVERSATIONS_STORAGE_KEY).is_none());
    }

    #[test]
    fn clear_resets_state_and_snapshot() {
        let f = fixture();
        f.cache.set_active(Some(CONV_A));
        f.cache.apply_message_insert(&message(1, CONV_A, FRIEND, 30));
        f.cache.clear();

        assert!(f.cache.conversations().is_empty());
        assert!(f.cache.active().is_none());
        assert!(f.cache.viewer().is_none());
        assert!(f.cache.history(CONV_A).is_empty());
        assert_eq!(f.store.raw(CONVERSATIONS_STORAGE_KEY).as_deref(), Some("[]"));
    }
}
