//! REST helpers for loading the chats snapshot.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as [`ApiError`]; callers keep the previous snapshot
//! and retry on the next refresh instead of clearing the badge.

use frames::ChatSummary;
use uuid::Uuid;

use crate::state::unread::SnapshotEntry;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned status {0}")]
    Status(u16),
}

/// Reduce server chat summaries to the fields the badge needs.
#[must_use]
pub fn snapshot_from_summaries(chats: &[ChatSummary]) -> Vec<SnapshotEntry> {
    chats.iter().map(SnapshotEntry::from).collect()
}

/// Fetch `GET {base_url}/chats/{user_id}` and reduce it to a snapshot.
///
/// # Errors
///
/// Returns an error if the request fails, the server answers non-2xx, or
/// the body is not a list of chat summaries.
pub async fn fetch_chats_snapshot(
    http: &reqwest::Client,
    base_url: &str,
    user_id: Uuid,
) -> Result<Vec<SnapshotEntry>, ApiError> {
    let url = format!("{}/chats/{user_id}", base_url.trim_end_matches('/'));
    let resp = http
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(ApiError::Status(resp.status().as_u16()));
    }
    let chats: Vec<ChatSummary> = resp
        .json()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    tracing::debug!(%user_id, chats = chats.len(), "api: chats snapshot loaded");
    Ok(snapshot_from_summaries(&chats))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
