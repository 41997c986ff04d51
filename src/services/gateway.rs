//! Chat gateway: per-connection protocol state machine.
//!
//! DESIGN
//! ======
//! A connection moves `Connecting -> {UserRoom | ChatRoom | Rejected} ->
//! Disconnected`. The handshake query is decoded into a typed
//! [`Handshake`] that fails closed: a missing `userId` or any malformed id
//! rejects the connection. With no `chatId` the connection joins its user's
//! notification room; with one, it joins that chat room after the
//! participant check. Admission is decided once and never changes.
//!
//! Inbound frames are decoded into [`frames::ClientEvent`]. Anything else
//! gets an `error` event and the connection stays open. Replies go to the
//! sender only; fan-out happens inside the chat service.

use frames::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::chat;
use super::registry::RoomKey;
use super::store::{CHAT_NOT_FOUND_MESSAGE, ChatError, INVALID_PAYLOAD_MESSAGE};
use crate::frame::{ErrorCode, error_event};
use crate::state::AppState;

// =============================================================================
// HANDSHAKE
// =============================================================================

/// Why a connection was not admitted. The display text is the `error` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("userId required in query")]
    MissingUserId,
    #[error("invalid {0} in query")]
    MalformedId(&'static str),
    #[error("{}", CHAT_NOT_FOUND_MESSAGE)]
    AccessDenied,
    #[error("Failed to join chat")]
    Unavailable,
}

impl ErrorCode for Rejection {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingUserId => "E_USER_ID_REQUIRED",
            Self::MalformedId(_) => "E_MALFORMED_ID",
            Self::AccessDenied => "E_CHAT_NOT_FOUND",
            Self::Unavailable => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Identity and target chat claimed by a connecting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    pub user_id: Uuid,
    pub chat_id: Option<Uuid>,
}

impl Handshake {
    /// Decode `userId` / `chatId` from query pairs. The first value of a
    /// repeated key wins, and an empty value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MissingUserId`] without a user id and
    /// [`Rejection::MalformedId`] when either id is not a UUID.
    pub fn from_query(params: &[(String, String)]) -> Result<Self, Rejection> {
        let user_id = parse_param(params, "userId")?.ok_or(Rejection::MissingUserId)?;
        let chat_id = parse_param(params, "chatId")?;
        Ok(Self { user_id, chat_id })
    }
}

fn parse_param(params: &[(String, String)], key: &'static str) -> Result<Option<Uuid>, Rejection> {
    let Some((_, raw)) = params.iter().find(|(k, _)| k == key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Uuid>().map(Some).map_err(|_| Rejection::MalformedId(key))
}

// =============================================================================
// SESSION
// =============================================================================

/// Room a connection was admitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    UserRoom,
    ChatRoom(Uuid),
}

/// An admitted connection. Fixed for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub connection_id: Uuid,
    pub user_id: Uuid,
    pub membership: Membership,
}

impl Session {
    #[must_use]
    pub fn chat_id(&self) -> Option<Uuid> {
        match self.membership {
            Membership::ChatRoom(chat_id) => Some(chat_id),
            Membership::UserRoom => None,
        }
    }

    #[must_use]
    pub fn room(&self) -> RoomKey {
        match self.membership {
            Membership::ChatRoom(chat_id) => RoomKey::Chat(chat_id),
            Membership::UserRoom => RoomKey::User(self.user_id),
        }
    }
}

/// Decode the handshake and admit the connection into its room.
///
/// # Errors
///
/// Returns the [`Rejection`] to report before closing the connection.
pub async fn admit(
    state: &AppState,
    params: &[(String, String)],
    connection_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
) -> Result<Session, Rejection> {
    let handshake = Handshake::from_query(params)?;
    let user_id = handshake.user_id;

    let Some(chat_id) = handshake.chat_id else {
        state.registry.admit_user_room(user_id, connection_id, tx).await;
        return Ok(Session { connection_id, user_id, membership: Membership::UserRoom });
    };

    match state
        .registry
        .admit_chat_room(state.store.as_ref(), chat_id, user_id, connection_id, tx)
        .await
    {
        Ok(_) => Ok(Session { connection_id, user_id, membership: Membership::ChatRoom(chat_id) }),
        Err(ChatError::Database(e)) => {
            warn!(%connection_id, %chat_id, error = %e, "gateway: chat lookup failed");
            Err(Rejection::Unavailable)
        }
        Err(e) => {
            info!(%connection_id, %user_id, %chat_id, error_code = e.error_code(), "gateway: chat admission denied");
            Err(Rejection::AccessDenied)
        }
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// Handle one inbound text frame. Returns the events to send back to this
/// connection only.
pub async fn handle_inbound_text(state: &AppState, session: &Session, text: &str) -> Vec<ServerEvent> {
    let event = match frames::decode_client_event(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(connection_id = %session.connection_id, error = %e, "gateway: invalid inbound event");
            return vec![ServerEvent::error(INVALID_PAYLOAD_MESSAGE)];
        }
    };

    match event {
        ClientEvent::Message(payload) => {
            match chat::send_message(state, session.chat_id(), session.user_id, &payload.content).await {
                Ok(_) => Vec::new(),
                Err(e) => vec![error_event(&e)],
            }
        }
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
