//! Unread badge reconciliation.
//!
//! DESIGN
//! ======
//! Three inputs feed the badge:
//! - the last chats snapshot from the server (per-chat last-message time),
//! - durable last-read stamps, one per chat,
//! - pending counters bumped by live `new_message` events.
//!
//! A snapshot chat counts once when its last message is newer than its
//! last-read stamp. Pending counters are added on top and cover only what
//! arrived since the last snapshot: `record_chats_snapshot` resets them,
//! and `mark_read` resets the one for its chat. Until the next snapshot, a
//! live message for a chat the old snapshot already counted as unread is
//! counted in both places.
//!
//! The reducer is [`badge_count`], a pure function. `UnreadStore` is the
//! single owner of the inputs; the app constructs one and passes it by
//! handle.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use frames::{ChatSummary, ServerEvent};
use tracing::warn;
use uuid::Uuid;

use crate::storage::LastReadStore;

/// One chat as seen in the server snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub chat_id: Uuid,
    /// `None` for chats without messages.
    pub last_message_timestamp: Option<i64>,
}

impl From<&ChatSummary> for SnapshotEntry {
    fn from(chat: &ChatSummary) -> Self {
        Self { chat_id: chat.id, last_message_timestamp: chat.last_message_timestamp }
    }
}

/// A notification the app shell should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub chat_id: Uuid,
    pub title: String,
    pub body: String,
}

/// Badge count from a snapshot, last-read stamps, and pending counters.
///
/// A chat with no stamp counts as never read.
#[must_use]
pub fn badge_count(snapshot: &[SnapshotEntry], last_read: &HashMap<Uuid, i64>, pending: &HashMap<Uuid, u32>) -> u32 {
    let base = snapshot
        .iter()
        .filter(|entry| {
            let read_at = last_read.get(&entry.chat_id).copied().unwrap_or(0);
            entry.last_message_timestamp.is_some_and(|ts| ts > read_at)
        })
        .count();
    let base = u32::try_from(base).unwrap_or(u32::MAX);
    pending.values().fold(base, |acc, n| acc.saturating_add(*n))
}

// =============================================================================
// STORE
// =============================================================================

pub struct UnreadStore<S: LastReadStore> {
    storage: S,
    snapshot: Vec<SnapshotEntry>,
    pending: HashMap<Uuid, u32>,
    current_chat: Option<Uuid>,
    badge: u32,
}

impl<S: LastReadStore> UnreadStore<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage, snapshot: Vec::new(), pending: HashMap::new(), current_chat: None, badge: 0 }
    }

    /// Last computed badge count.
    #[must_use]
    pub fn badge(&self) -> u32 {
        self.badge
    }

    #[must_use]
    pub fn pending_for(&self, chat_id: Uuid) -> u32 {
        self.pending.get(&chat_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace the authoritative chat view. Pending counters are dropped;
    /// the snapshot already reflects those messages.
    pub fn record_chats_snapshot(&mut self, chats: Vec<SnapshotEntry>) -> u32 {
        self.snapshot = chats;
        self.pending.clear();
        self.recompute()
    }

    /// Mark `chat_id` read as of now.
    pub fn mark_read(&mut self, chat_id: Uuid) -> u32 {
        self.mark_read_at(chat_id, now_ms())
    }

    /// Mark `chat_id` read as of `at_ms`. Clears its pending counter even
    /// when the stamp cannot be persisted.
    pub fn mark_read_at(&mut self, chat_id: Uuid, at_ms: i64) -> u32 {
        if let Err(e) = self.storage.set_last_read(chat_id, at_ms) {
            warn!(%chat_id, error = %e, "unread: failed to persist last-read");
        }
        self.pending.remove(&chat_id);
        self.recompute()
    }

    /// Count one live message for `chat_id` unless that chat is open.
    pub fn on_live_message(&mut self, chat_id: Uuid) -> u32 {
        if self.current_chat == Some(chat_id) {
            return self.badge;
        }
        *self.pending.entry(chat_id).or_insert(0) += 1;
        self.recompute()
    }

    pub fn recompute(&mut self) -> u32 {
        let last_read: HashMap<Uuid, i64> = self
            .snapshot
            .iter()
            .filter_map(|entry| {
                self.storage
                    .last_read(entry.chat_id)
                    .map(|at| (entry.chat_id, at))
            })
            .collect();
        self.badge = badge_count(&self.snapshot, &last_read, &self.pending);
        self.badge
    }

    /// Record which chat screen is open, `None` when none is.
    pub fn set_current_chat(&mut self, chat_id: Option<Uuid>) {
        self.current_chat = chat_id;
    }

    #[must_use]
    pub fn current_chat(&self) -> Option<Uuid> {
        self.current_chat
    }

    /// Apply a server event. Returns the notification to display, if any.
    ///
    /// Only `new_message` affects unread state, and only when its chat is
    /// not the one on screen.
    pub fn handle_server_event(&mut self, event: &ServerEvent) -> Option<LocalNotification> {
        let ServerEvent::NewMessage(note) = event else {
            return None;
        };
        if self.current_chat == Some(note.chat_id) {
            return None;
        }

        self.on_live_message(note.chat_id);
        Some(LocalNotification {
            chat_id: note.chat_id,
            title: frames::notification_title(&note.sender_username),
            body: frames::notification_preview(&note.message.content),
        })
    }
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "unread_test.rs"]
mod unread_test;
