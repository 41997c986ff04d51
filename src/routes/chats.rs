//! Chat REST routes: listing, history, and find-or-create.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use frames::{ChatMessage, ChatSummary, FindOrCreateChat, UserSummary};
use uuid::Uuid;

use super::chat_error_to_status;
use crate::state::AppState;

/// `GET /chats/{userId}`: the user's chats, most recent message first.
pub async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ChatSummary>>, StatusCode> {
    let chats = state
        .store
        .list_chats_for_user(user_id)
        .await
        .map_err(chat_error_to_status)?;
    Ok(Json(chats))
}

/// `GET /chats/{userId}/{chatId}`: one chat, as seen by a participant.
pub async fn get_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChatSummary>, StatusCode> {
    let chat = state
        .store
        .find_participant_chat(chat_id, user_id)
        .await
        .map_err(chat_error_to_status)?;
    let other = state
        .store
        .find_user(chat.other_participant(user_id))
        .await
        .map_err(chat_error_to_status)?;

    Ok(Json(chat.summary_for(UserSummary { id: other.id, username: other.username })))
}

/// `GET /chats/{userId}/{chatId}/messages`: full history, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<ChatMessage>>, StatusCode> {
    let messages = state
        .store
        .list_messages(chat_id, user_id)
        .await
        .map_err(chat_error_to_status)?;
    Ok(Json(messages.iter().map(ChatMessage::from).collect()))
}

/// `POST /chats`: the chat between two users as seen by `user1Id`, created
/// if needed.
pub async fn find_or_create_chat(
    State(state): State<AppState>,
    Json(body): Json<FindOrCreateChat>,
) -> Result<Json<ChatSummary>, StatusCode> {
    let chat = state
        .store
        .find_or_create_chat(body.user1_id, body.user2_id)
        .await
        .map_err(chat_error_to_status)?;
    let other = state
        .store
        .find_user(body.user2_id)
        .await
        .map_err(chat_error_to_status)?;

    Ok(Json(chat.summary_for(UserSummary { id: other.id, username: other.username })))
}

#[cfg(test)]
#[path = "chats_test.rs"]
mod tests;
