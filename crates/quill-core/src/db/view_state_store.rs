//! Restart-survivable key/value slots for UI state

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for view state storage operations
pub trait ViewStateStore {
    /// Load the value stored under `key`.
    ///
    /// Missing keys and payloads that no longer decode both yield `None`.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Store `value` under `key`, replacing any previous value
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;

    /// Remove the value stored under `key`
    fn clear(&self, key: &str) -> Result<()>;
}

/// `SQLite` implementation of `ViewStateStore`
pub struct SqliteViewStateStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteViewStateStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ViewStateStore for SqliteViewStateStore<'_> {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM view_state WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!("Discarding unreadable view state '{key}': {error}");
                Ok(None)
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO view_state (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, raw, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM view_state WHERE key = ?", params![key])?;
        Ok(())
    }
}
