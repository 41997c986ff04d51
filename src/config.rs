//! Server configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so values there behave the
//! same as exported variables.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_WS_CLIENT_BUFFER: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Outbound event queue depth per WebSocket connection.
    pub ws_client_buffer: usize,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// - `PORT`: default 3000, must parse when set
    /// - `DATABASE_URL`: optional; empty counts as unset
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `WS_CLIENT_BUFFER`: default 256, minimum 1
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw.clone() })?,
            Err(_) => DEFAULT_PORT,
        };
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            port,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            ws_client_buffer: env_parse("WS_CLIENT_BUFFER", DEFAULT_WS_CLIENT_BUFFER).max(1),
        })
    }
}

/// Parse an environment variable, falling back to `default` when it is
/// unset or unparsable.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
