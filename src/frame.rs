//! Server-side helpers around the shared `frames` wire model.
//!
//! DESIGN
//! ======
//! Typed service errors carry a grepable code for logs. Clients only ever
//! see the `error {message}` event, so the code stays server-side and the
//! message is what the user reads.

use std::time::{SystemTime, UNIX_EPOCH};

use frames::ServerEvent;

/// Grepable error code and retryable flag for structured error logging.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }

    /// Text shown to the client. Defaults to the `Display` form.
    fn client_message(&self) -> String {
        self.to_string()
    }
}

/// Build the `error` event sent to a client for a typed error.
#[must_use]
pub fn error_event(err: &(impl ErrorCode + ?Sized)) -> ServerEvent {
    ServerEvent::error(err.client_message())
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
