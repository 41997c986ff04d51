//! Chat service: the send pipeline behind the `message` event.
//!
//! DESIGN
//! ======
//! Chat and sender come from the connection handshake, never from the
//! payload. A send is persisted first; only a committed message is
//! broadcast, so a failed write produces no `message`, no `new_message`, and
//! no push. After the chat-room broadcast the recipient is resolved and
//! notified on their user room, then the dispatcher decides about push.
//!
//! Per-connection processing is sequential, so one sender's messages reach
//! the chat room in the order they were committed.

use frames::{ChatMessage, NewMessage, ServerEvent};
use tracing::{info, warn};
use uuid::Uuid;

use super::notify;
use super::registry::RoomKey;
use super::store::{ChatError, Message};
use crate::frame::ErrorCode;
use crate::state::AppState;

/// Persist `content` from `sender_id` into `chat_id` and fan it out.
///
/// # Errors
///
/// Returns [`ChatError::Validation`] when the connection has no chat or the
/// content is blank, [`ChatError::NotFound`] when the sender is not a
/// participant, and [`ChatError::Database`] when the write fails.
pub async fn send_message(
    state: &AppState,
    chat_id: Option<Uuid>,
    sender_id: Uuid,
    content: &str,
) -> Result<Message, ChatError> {
    let Some(chat_id) = chat_id else {
        return Err(ChatError::invalid_payload());
    };
    let content = content.trim();
    if content.is_empty() {
        return Err(ChatError::invalid_payload());
    }

    let message = state
        .store
        .append_message(chat_id, sender_id, content)
        .await
        .inspect_err(|e| warn!(%chat_id, %sender_id, error = %e, error_code = e.error_code(), retryable = e.retryable(), "chat: append failed"))?;

    let wire = ChatMessage::from(&message);
    let delivered = state
        .registry
        .broadcast_to_room(RoomKey::Chat(chat_id), &ServerEvent::Message(wire.clone()))
        .await;
    info!(%chat_id, %sender_id, message_id = %message.id, delivered, "chat: message sent");

    // Resolution failure does not undo the send; the message is already live.
    let recipient = match state.store.recipient_for_chat(chat_id, sender_id).await {
        Ok(Some(recipient)) => recipient,
        Ok(None) => return Ok(message),
        Err(e) => {
            warn!(%chat_id, error = %e, "chat: recipient lookup failed");
            return Ok(message);
        }
    };

    let event = ServerEvent::NewMessage(NewMessage {
        chat_id,
        message: wire,
        sender_username: recipient.sender_username.clone(),
    });
    state.registry.broadcast_to_user(recipient.user_id, &event).await;

    let outcome = notify::dispatch(state, &recipient, chat_id, &message.content).await;
    info!(%chat_id, recipient_id = %recipient.user_id, ?outcome, "chat: recipient notified");

    Ok(message)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
