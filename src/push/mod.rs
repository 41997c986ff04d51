//! Push: best-effort device notifications for recipients not in the app.
//!
//! DESIGN
//! ======
//! `PushClient` posts one JSON request per message to a configured provider
//! endpoint with a bearer key. Configuration comes from environment
//! variables; when they are absent the server runs without push and live
//! socket delivery is unaffected. Callers hold the client as
//! `Arc<dyn PushSender>` so tests can substitute a recorder.

pub mod config;
pub mod types;

use std::time::Duration;

use config::PushConfig;
pub use types::{PushError, PushMessage, PushSender};

// =============================================================================
// CLIENT
// =============================================================================

pub struct PushClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PushClient {
    /// Build a push client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if push is not configured or the HTTP client fails.
    pub fn from_env() -> Result<Self, PushError> {
        Self::from_config(PushConfig::from_env()?)
    }

    /// Build a push client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: PushConfig) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| PushError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint: config.endpoint, api_key: config.api_key })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl PushSender for PushClient {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| PushError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PushError::Request(e.to_string()))?;

        check_status(status, body)
    }
}

fn check_status(status: u16, body: String) -> Result<(), PushError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(PushError::Rejected { status, body })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
