//! Push configuration parsed from environment variables.

use super::types::PushError;
use crate::config::env_parse;

pub const DEFAULT_PUSH_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PUSH_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeouts: PushTimeouts,
}

impl PushConfig {
    /// Build typed push config from environment variables.
    ///
    /// Required:
    /// - `PUSH_ENDPOINT`: provider send URL
    /// - `PUSH_API_KEY_ENV` (names the env var containing the key)
    ///
    /// Optional:
    /// - `PUSH_REQUEST_TIMEOUT_SECS`: default 10
    /// - `PUSH_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`PushError::NotConfigured`] naming the first missing variable.
    pub fn from_env() -> Result<Self, PushError> {
        let endpoint = required("PUSH_ENDPOINT")?;
        let key_var = required("PUSH_API_KEY_ENV")?;
        let api_key = required(&key_var)?;
        let timeouts = PushTimeouts {
            request_secs: env_parse("PUSH_REQUEST_TIMEOUT_SECS", DEFAULT_PUSH_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("PUSH_CONNECT_TIMEOUT_SECS", DEFAULT_PUSH_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { endpoint, api_key, timeouts })
    }
}

fn required(var: &str) -> Result<String, PushError> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PushError::NotConfigured { var: var.to_owned() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
