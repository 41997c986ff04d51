//! Message store adapter: the persistence seam for chats and messages.
//!
//! DESIGN
//! ======
//! `ChatStore` is the only way the gateway and REST routes touch persisted
//! chat state. `find_participant_chat` is the authorization primitive: every
//! read or write of a chat goes through a participant check first, and a
//! non-participant gets the same `NotFound` as a missing chat so chat
//! existence never leaks.
//!
//! INVARIANTS
//! ==========
//! - At most one chat exists per unordered pair of users.
//! - `append_message` inserts the message and rewrites the chat summary as
//!   one atomic unit; summary text and timestamp are always written together.
//! - Messages list in creation order, insertion order breaking ties.

use frames::{ChatMessage, ChatSummary, UserSummary};
use uuid::Uuid;

use crate::frame::ErrorCode;

/// Maximum characters kept in a chat's `last_message` summary.
pub const LAST_MESSAGE_MAX_CHARS: usize = 200;

/// Shown for every failed chat lookup, whatever the cause.
pub const CHAT_NOT_FOUND_MESSAGE: &str = "Chat not found or access denied";

/// Shown for blank content or a send without a chat context.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid message payload";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{}", CHAT_NOT_FOUND_MESSAGE)]
    NotFound,
    #[error("user(s) not found: {}", join_ids(.0))]
    UsersNotFound(Vec<Uuid>),
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ChatError {
    #[must_use]
    pub fn invalid_payload() -> Self {
        Self::Validation(INVALID_PAYLOAD_MESSAGE.into())
    }
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_CHAT_NOT_FOUND",
            Self::UsersNotFound(_) => "E_USER_NOT_FOUND",
            Self::UsernameTaken(_) => "E_USERNAME_TAKEN",
            Self::Validation(_) => "E_VALIDATION",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    fn client_message(&self) -> String {
        match self {
            Self::Database(_) => "Failed to send message".into(),
            other => other.to_string(),
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

/// A registered user, reduced to what the chat core consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub push_token: Option<String>,
    pub created_at: i64,
}

/// A two-party conversation. Mirrors the `chats` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub last_message: Option<String>,
    pub last_message_timestamp: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The participant that is not `user_id`. Only meaningful for participants.
    #[must_use]
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.user1_id == user_id { self.user2_id } else { self.user1_id }
    }

    /// Whether this chat joins exactly the unordered pair `(a, b)`.
    #[must_use]
    pub fn joins(&self, a: Uuid, b: Uuid) -> bool {
        (self.user1_id == a && self.user2_id == b) || (self.user1_id == b && self.user2_id == a)
    }

    /// REST view of this chat as seen by the participant opposite `other_user`.
    #[must_use]
    pub fn summary_for(&self, other_user: UserSummary) -> ChatSummary {
        ChatSummary {
            id: self.id,
            other_user,
            last_message: self.last_message.clone(),
            last_message_timestamp: self.last_message_timestamp,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A persisted message. Mirrors the `messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: i64,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id,
            chat_id: msg.chat_id,
            sender_id: msg.sender_id,
            content: msg.content.clone(),
            created_at: msg.created_at,
        }
    }
}

/// Who to notify about a new message, resolved from the sender's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    pub push_token: Option<String>,
    pub sender_username: String,
}

/// Summary text stored on the chat row for a message body.
#[must_use]
pub fn summary_text(content: &str) -> String {
    frames::truncate_chars(content, LAST_MESSAGE_MAX_CHARS).to_owned()
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Persistence operations the chat core relies on.
#[async_trait::async_trait]
pub trait ChatStore: Send + Sync {
    /// Register a user with a unique username.
    async fn create_user(&self, username: &str) -> Result<User, ChatError>;

    async fn find_user(&self, user_id: Uuid) -> Result<User, ChatError>;

    /// Set or clear (`None`) the push token for a user.
    async fn set_push_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), ChatError>;

    /// Return the chat iff `user_id` participates in it.
    async fn find_participant_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError>;

    /// Order-independent lookup; creates the chat when absent and both users exist.
    async fn find_or_create_chat(&self, user1_id: Uuid, user2_id: Uuid) -> Result<Chat, ChatError>;

    /// Chats of `user_id`, most recent message first, chats without messages last.
    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<ChatSummary>, ChatError>;

    /// Persist a message and update the chat summary atomically.
    async fn append_message(&self, chat_id: Uuid, sender_id: Uuid, content: &str) -> Result<Message, ChatError>;

    /// All messages of a chat in creation order, after the participant check.
    async fn list_messages(&self, chat_id: Uuid, user_id: Uuid) -> Result<Vec<Message>, ChatError>;

    /// Resolve the other participant of `chat_id` from `sender_id`'s side.
    async fn recipient_for_chat(&self, chat_id: Uuid, sender_id: Uuid) -> Result<Option<Recipient>, ChatError>;
}

/// Reject a chat between a user and themself before touching storage.
///
/// # Errors
///
/// Returns [`ChatError::Validation`] when both ids are equal.
pub fn ensure_distinct_users(user1_id: Uuid, user2_id: Uuid) -> Result<(), ChatError> {
    if user1_id == user2_id {
        return Err(ChatError::Validation("a chat needs two different users".into()));
    }
    Ok(())
}

/// Reject blank usernames. Returns the trimmed name.
///
/// # Errors
///
/// Returns [`ChatError::Validation`] for empty or whitespace-only names.
pub fn normalize_username(raw: &str) -> Result<&str, ChatError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ChatError::Validation("username required".into()));
    }
    Ok(name)
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
