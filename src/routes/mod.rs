//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the chat websocket and the REST endpoints the mobile
//! client uses to list chats, load history, and manage push tokens.

pub mod chats;
pub mod users;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::frame::ErrorCode;
use crate::services::store::ChatError;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/chats", post(chats::find_or_create_chat))
        .route("/chats/{user_id}", get(chats::list_chats))
        .route("/chats/{user_id}/{chat_id}", get(chats::get_chat))
        .route("/chats/{user_id}/{chat_id}/messages", get(chats::list_messages))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/push-token", put(users::set_push_token))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub(crate) fn chat_error_to_status(err: ChatError) -> StatusCode {
    match err {
        ChatError::NotFound | ChatError::UsersNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatError::UsernameTaken(_) => StatusCode::CONFLICT,
        ChatError::Database(_) => {
            warn!(error = %err, error_code = err.error_code(), "rest: database error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
