//! Push types: the sender trait, its error, and the outbound message shape.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Android channel that chat pushes are posted to.
pub const CHAT_CHANNEL_ID: &str = "jammit_chat_messages";

/// Value of `data.type` on chat pushes; clients route on it.
pub const CHAT_MESSAGE_TYPE: &str = "chat_message";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// A required environment variable is not set.
    #[error("push not configured: env var {var} not set")]
    NotConfigured { var: String },

    /// The HTTP request to the push provider failed.
    #[error("push request failed: {0}")]
    Request(String),

    /// The push provider returned a non-success HTTP status.
    #[error("push rejected: status {status}")]
    Rejected { status: u16, body: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::frame::ErrorCode for PushError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "E_PUSH_NOT_CONFIGURED",
            Self::Request(_) => "E_PUSH_REQUEST",
            Self::Rejected { .. } => "E_PUSH_REJECTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// MESSAGE
// =============================================================================

/// One push to one device, serialized as the provider request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub message: PushTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushTarget {
    pub token: String,
    pub notification: PushNotification,
    /// Provider data maps carry string values only.
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    pub channel_id: String,
}

impl PushMessage {
    /// Push announcing a chat message from `sender_username`.
    #[must_use]
    pub fn chat_message(token: &str, chat_id: Uuid, sender_username: &str, content: &str) -> Self {
        let data = BTreeMap::from([
            ("type".to_owned(), CHAT_MESSAGE_TYPE.to_owned()),
            ("chatId".to_owned(), chat_id.to_string()),
            ("senderUsername".to_owned(), sender_username.to_owned()),
            ("content".to_owned(), content.to_owned()),
        ]);

        Self {
            message: PushTarget {
                token: token.to_owned(),
                notification: PushNotification {
                    title: frames::notification_title(sender_username),
                    body: frames::notification_preview(content),
                },
                data,
                android: AndroidConfig {
                    priority: "high".into(),
                    notification: AndroidNotification { channel_id: CHAT_CHANNEL_ID.into() },
                },
            },
        }
    }
}

// =============================================================================
// SENDER
// =============================================================================

/// Delivers pushes to a provider. Callers treat delivery as best-effort.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
