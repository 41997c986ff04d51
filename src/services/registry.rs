//! Connection registry: live connections grouped into rooms.
//!
//! DESIGN
//! ======
//! Every admitted connection belongs to exactly one room, either the
//! notification room of its user (`user:<id>`) or a chat room
//! (`chat:<id>`). Membership is fixed at handshake and dropped on
//! disconnect. Rooms are created on first admission and removed when their
//! last connection leaves, so `room_size` of an unknown room is zero.
//!
//! Broadcasts are best-effort: a connection whose outbound channel is full
//! or closed is skipped rather than awaited, so one slow socket cannot stall
//! fan-out to the rest of the room.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use frames::ServerEvent;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{Chat, ChatError, ChatStore};

// =============================================================================
// ROOM KEYS
// =============================================================================

/// Namespaced room identifier. Chat and user ids never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Chat(Uuid),
    User(Uuid),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "chat:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
struct Inner {
    /// room -> connection id -> outbound sender.
    rooms: HashMap<RoomKey, HashMap<Uuid, mpsc::Sender<ServerEvent>>>,
    /// connection id -> (room, user id).
    memberships: HashMap<Uuid, (RoomKey, Uuid)>,
}

impl Inner {
    fn insert(&mut self, room: RoomKey, user_id: Uuid, connection_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        // A connection id is admitted once; re-admission moves it.
        self.remove(connection_id);
        self.rooms.entry(room).or_default().insert(connection_id, tx);
        self.memberships.insert(connection_id, (room, user_id));
    }

    fn remove(&mut self, connection_id: Uuid) -> Option<RoomKey> {
        let (room, _) = self.memberships.remove(&connection_id)?;
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
        Some(room)
    }
}

/// Shared handle to the room map. Clone is cheap.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection into its user's notification room.
    pub async fn admit_user_room(&self, user_id: Uuid, connection_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        let room = RoomKey::User(user_id);
        self.inner.write().await.insert(room, user_id, connection_id, tx);
        info!(%connection_id, %user_id, %room, "registry: admitted");
    }

    /// Admit a connection into a chat room after checking participation.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotFound`] when the chat does not exist or
    /// `user_id` is not a participant; nothing is registered in that case.
    pub async fn admit_chat_room(
        &self,
        store: &dyn ChatStore,
        chat_id: Uuid,
        user_id: Uuid,
        connection_id: Uuid,
        tx: mpsc::Sender<ServerEvent>,
    ) -> Result<Chat, ChatError> {
        let chat = store.find_participant_chat(chat_id, user_id).await?;
        let room = RoomKey::Chat(chat.id);
        self.inner.write().await.insert(room, user_id, connection_id, tx);
        info!(%connection_id, %user_id, %room, "registry: admitted");
        Ok(chat)
    }

    /// Drop a connection from its room. Unknown ids are a no-op.
    pub async fn release(&self, connection_id: Uuid) {
        if let Some(room) = self.inner.write().await.remove(connection_id) {
            info!(%connection_id, %room, "registry: released");
        }
    }

    /// Send `event` to every connection in `room`. Returns how many
    /// connections accepted it.
    pub async fn broadcast_to_room(&self, room: RoomKey, event: &ServerEvent) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&room) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, tx) in members {
            // Best-effort: if a client's channel is full, skip it.
            if tx.try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(%connection_id, %room, event = event.name(), "registry: dropped event for slow client");
            }
        }
        delivered
    }

    /// Send `event` to the notification room of `user_id`.
    pub async fn broadcast_to_user(&self, user_id: Uuid, event: &ServerEvent) -> usize {
        self.broadcast_to_room(RoomKey::User(user_id), event).await
    }

    /// Whether `user_id` has a connection admitted to the chat room.
    pub async fn is_viewing_chat(&self, user_id: Uuid, chat_id: Uuid) -> bool {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&RoomKey::Chat(chat_id)) else {
            return false;
        };
        members
            .keys()
            .any(|conn| inner.memberships.get(conn).is_some_and(|(_, uid)| *uid == user_id))
    }

    pub async fn room_size(&self, room: RoomKey) -> usize {
        self.inner.read().await.rooms.get(&room).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
