//! Notification dispatcher: push-or-suppress for one new message.
//!
//! DESIGN
//! ======
//! The recipient is "viewing" a chat when one of their connections is
//! admitted to that chat room. A viewing recipient already got the message
//! live, so no push is sent. Otherwise a best-effort push goes out when the
//! server has a push sender and the recipient has a token. Push failures are
//! logged and swallowed; the sender never hears about them.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::store::Recipient;
use crate::frame::ErrorCode;
use crate::push::PushMessage;
use crate::state::AppState;

/// What the dispatcher did with a message. Returned for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    SuppressedViewing,
    NoPushProvider,
    NoPushToken,
    Pushed,
    PushFailed,
}

/// Decide and perform out-of-app delivery for a message in `chat_id`.
pub async fn dispatch(state: &AppState, recipient: &Recipient, chat_id: Uuid, content: &str) -> DispatchOutcome {
    let recipient_id = recipient.user_id;

    if state.registry.is_viewing_chat(recipient_id, chat_id).await {
        debug!(%recipient_id, %chat_id, "notify: recipient viewing chat, push suppressed");
        return DispatchOutcome::SuppressedViewing;
    }

    let Some(push) = state.push.as_ref() else {
        return DispatchOutcome::NoPushProvider;
    };

    let Some(token) = recipient.push_token.as_deref() else {
        debug!(%recipient_id, "notify: recipient has no push token");
        return DispatchOutcome::NoPushToken;
    };

    let message = PushMessage::chat_message(token, chat_id, &recipient.sender_username, content);
    match push.send(&message).await {
        Ok(()) => {
            info!(%recipient_id, %chat_id, "notify: push sent");
            DispatchOutcome::Pushed
        }
        Err(e) => {
            warn!(%recipient_id, %chat_id, error = %e, error_code = e.error_code(), retryable = e.retryable(), "notify: push failed");
            DispatchOutcome::PushFailed
        }
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
