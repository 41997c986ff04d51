//! In-memory `ChatStore` used when no database is configured, and by tests.
//!
//! DESIGN
//! ======
//! One async mutex guards all tables, so every operation is a single atomic
//! step: a reader can never see a chat summary without its message. Message
//! timestamps come from the wall clock but never go backwards, and the
//! message vector is append-only, so vector order is insertion order.

use std::collections::HashMap;

use frames::{ChatSummary, UserSummary};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{
    Chat, ChatError, ChatStore, Message, Recipient, User, ensure_distinct_users, normalize_username, summary_text,
};
use crate::frame::now_ms;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chats: HashMap<Uuid, Chat>,
    messages: Vec<Message>,
    last_ts: i64,
}

impl Tables {
    /// Store clock: wall time, clamped to be non-decreasing.
    fn tick(&mut self) -> i64 {
        self.last_ts = self.last_ts.max(now_ms());
        self.last_ts
    }

    fn participant_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<&Chat, ChatError> {
        self.chats
            .get(&chat_id)
            .filter(|chat| chat.has_participant(user_id))
            .ok_or(ChatError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryChatStore {
    tables: Mutex<Tables>,
}

impl MemoryChatStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ChatStore for MemoryChatStore {
    async fn create_user(&self, username: &str) -> Result<User, ChatError> {
        let username = normalize_username(username)?;
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(ChatError::UsernameTaken(username.to_owned()));
        }
        let user = User { id: Uuid::new_v4(), username: username.to_owned(), push_token: None, created_at: tables.tick() };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User, ChatError> {
        let tables = self.tables.lock().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ChatError::UsersNotFound(vec![user_id]))
    }

    async fn set_push_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), ChatError> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Err(ChatError::UsersNotFound(vec![user_id]));
        };
        user.push_token = token.map(str::to_owned);
        Ok(())
    }

    async fn find_participant_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError> {
        let tables = self.tables.lock().await;
        tables.participant_chat(chat_id, user_id).cloned()
    }

    async fn find_or_create_chat(&self, user1_id: Uuid, user2_id: Uuid) -> Result<Chat, ChatError> {
        ensure_distinct_users(user1_id, user2_id)?;
        let mut tables = self.tables.lock().await;

        if let Some(chat) = tables.chats.values().find(|c| c.joins(user1_id, user2_id)) {
            return Ok(chat.clone());
        }

        let missing: Vec<Uuid> = [user1_id, user2_id]
            .into_iter()
            .filter(|id| !tables.users.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(ChatError::UsersNotFound(missing));
        }

        let now = tables.tick();
        let chat = Chat {
            id: Uuid::new_v4(),
            user1_id,
            user2_id,
            last_message: None,
            last_message_timestamp: None,
            created_at: now,
            updated_at: now,
        };
        tables.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<ChatSummary>, ChatError> {
        let tables = self.tables.lock().await;
        let mut chats: Vec<&Chat> = tables
            .chats
            .values()
            .filter(|c| c.has_participant(user_id))
            .collect();
        // Newest message first; chats without messages last, newest chat first.
        chats.sort_by(|a, b| {
            b.last_message_timestamp
                .cmp(&a.last_message_timestamp)
                .then(b.created_at.cmp(&a.created_at))
        });

        let mut out = Vec::with_capacity(chats.len());
        for chat in chats {
            let other_id = chat.other_participant(user_id);
            let Some(other) = tables.users.get(&other_id) else {
                continue;
            };
            out.push(chat.summary_for(UserSummary { id: other.id, username: other.username.clone() }));
        }
        Ok(out)
    }

    async fn append_message(&self, chat_id: Uuid, sender_id: Uuid, content: &str) -> Result<Message, ChatError> {
        let mut tables = self.tables.lock().await;
        tables.participant_chat(chat_id, sender_id)?;

        let created_at = tables.tick();
        let message = Message { id: Uuid::new_v4(), chat_id, sender_id, content: content.to_owned(), created_at };
        tables.messages.push(message.clone());

        if let Some(chat) = tables.chats.get_mut(&chat_id) {
            chat.last_message = Some(summary_text(content));
            chat.last_message_timestamp = Some(created_at);
            chat.updated_at = created_at;
        }
        Ok(message)
    }

    async fn list_messages(&self, chat_id: Uuid, user_id: Uuid) -> Result<Vec<Message>, ChatError> {
        let tables = self.tables.lock().await;
        tables.participant_chat(chat_id, user_id)?;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn recipient_for_chat(&self, chat_id: Uuid, sender_id: Uuid) -> Result<Option<Recipient>, ChatError> {
        let tables = self.tables.lock().await;
        let Ok(chat) = tables.participant_chat(chat_id, sender_id) else {
            return Ok(None);
        };
        let (Some(recipient), Some(sender)) = (
            tables.users.get(&chat.other_participant(sender_id)),
            tables.users.get(&sender_id),
        ) else {
            return Ok(None);
        };
        Ok(Some(Recipient {
            user_id: recipient.id,
            push_token: recipient.push_token.clone(),
            sender_username: sender.username.clone(),
        }))
    }
}

#[cfg(test)]
#[path = "memory_store_test.rs"]
mod tests;
