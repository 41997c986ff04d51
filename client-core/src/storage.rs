//! Durable last-read stamps, keyed `"lastRead_" + chatId`.
//!
//! The app shell decides where values live (platform key-value store, a
//! file in the app's data directory). Two stores ship here: an in-memory
//! one for tests and short-lived sessions, and a JSON file store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use uuid::Uuid;

const LAST_READ_PREFIX: &str = "lastRead_";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage key for a chat's last-read stamp.
#[must_use]
pub fn last_read_key(chat_id: Uuid) -> String {
    format!("{LAST_READ_PREFIX}{chat_id}")
}

/// Key-value store of epoch-ms last-read stamps.
pub trait LastReadStore {
    /// Stamp for `chat_id`, `None` when the chat was never opened.
    fn last_read(&self, chat_id: Uuid) -> Option<i64>;

    /// Persist a stamp for `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn set_last_read(&mut self, chat_id: Uuid, at_ms: i64) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemoryLastReadStore {
    values: BTreeMap<String, i64>,
}

impl LastReadStore for MemoryLastReadStore {
    fn last_read(&self, chat_id: Uuid) -> Option<i64> {
        self.values.get(&last_read_key(chat_id)).copied()
    }

    fn set_last_read(&mut self, chat_id: Uuid, at_ms: i64) -> Result<(), StorageError> {
        self.values.insert(last_read_key(chat_id), at_ms);
        Ok(())
    }
}

// =============================================================================
// JSON FILE
// =============================================================================

/// Keeps every stamp in one JSON object, rewritten on each update.
#[derive(Debug)]
pub struct JsonFileLastReadStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl JsonFileLastReadStore {
    /// Open the store at `path`. A missing file starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }
}

impl LastReadStore for JsonFileLastReadStore {
    fn last_read(&self, chat_id: Uuid) -> Option<i64> {
        self.values.get(&last_read_key(chat_id)).copied()
    }

    fn set_last_read(&mut self, chat_id: Uuid, at_ms: i64) -> Result<(), StorageError> {
        self.values.insert(last_read_key(chat_id), at_ms);
        let text = serde_json::to_string(&self.values)?;
        // Atomic replace.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;
