//! User routes: registration, lookup, and push-token management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use frames::UserSummary;
use serde::Deserialize;
use uuid::Uuid;

use super::chat_error_to_status;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserBody {
    pub username: String,
}

#[derive(Deserialize)]
pub struct PushTokenBody {
    /// `null` clears the token.
    pub token: Option<String>,
}

/// `POST /users`: register a username.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<UserSummary>), StatusCode> {
    let user = state
        .store
        .create_user(&body.username)
        .await
        .map_err(chat_error_to_status)?;
    Ok((StatusCode::CREATED, Json(UserSummary { id: user.id, username: user.username })))
}

/// `GET /users/{id}`
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<UserSummary>, StatusCode> {
    let user = state
        .store
        .find_user(user_id)
        .await
        .map_err(chat_error_to_status)?;
    Ok(Json(UserSummary { id: user.id, username: user.username }))
}

/// `PUT /users/{id}/push-token`: set or clear the device push token.
pub async fn set_push_token(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<PushTokenBody>,
) -> Result<StatusCode, StatusCode> {
    let token = body.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
    state
        .store
        .set_push_token(user_id, token)
        .await
        .map_err(chat_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
