//! Shared event model and JSON codec for the realtime chat transport.
//!
//! This crate owns the wire representation used by both the server and the
//! client. Every WebSocket text frame is one JSON object of the form
//! `{"event": <name>, "data": <payload>}`. Decoding fails closed: unknown
//! event names, unknown fields on client payloads, and malformed ids are all
//! rejected instead of being read optimistically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum characters of a push/local notification body.
pub const PREVIEW_MAX_CHARS: usize = 80;

/// Suffix appended to a truncated notification body.
const PREVIEW_ELLIPSIS: &str = "...";

/// Error returned by the decode functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON or does not match any known event shape.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// A persisted chat message as broadcast to a chat-room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    /// Milliseconds since the Unix epoch, assigned by the store.
    pub created_at: i64,
}

/// Compact notification sent to the recipient's user-room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub message: ChatMessage,
    pub sender_username: String,
}

/// Body of the only client-originated event. Chat and sender come from the
/// connection handshake, so they are not accepted here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessage {
    pub content: String,
}

// =============================================================================
// EVENTS
// =============================================================================

/// Server → client events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case", deny_unknown_fields)]
pub enum ServerEvent {
    Error { message: String },
    Message(ChatMessage),
    NewMessage(NewMessage),
}

impl ServerEvent {
    /// Build an `error` event from any displayable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::Message(_) => "message",
            Self::NewMessage(_) => "new_message",
        }
    }
}

/// Client → server events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClientEvent {
    Message(SendMessage),
}

// =============================================================================
// REST DTOS
// =============================================================================

/// The other participant of a chat, as seen by the requesting user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// One row of `GET /chats/{userId}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: Uuid,
    pub other_user: UserSummary,
    pub last_message: Option<String>,
    pub last_message_timestamp: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of `POST /chats`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOrCreateChat {
    pub user1_id: Uuid,
    pub user2_id: Uuid,
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a server event as a JSON text frame.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_server_event(event: &ServerEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode a JSON text frame into a server event.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for anything that is not a known event.
pub fn decode_server_event(text: &str) -> Result<ServerEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode a client event as a JSON text frame.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_client_event(event: &ClientEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode a JSON text frame into a client event.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for unknown events or extra fields.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Truncate to at most `max_chars` characters, never splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Notification body for a message: content up to 80 characters, longer
/// content cut to 77 characters plus `...`.
#[must_use]
pub fn notification_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_MAX_CHARS {
        return content.to_owned();
    }
    let keep = PREVIEW_MAX_CHARS - PREVIEW_ELLIPSIS.len();
    format!("{}{PREVIEW_ELLIPSIS}", truncate_chars(content, keep))
}

/// Notification title for a message from `sender_username`.
#[must_use]
pub fn notification_title(sender_username: &str) -> String {
    format!("New message from {sender_username}")
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
