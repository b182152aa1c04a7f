//! Persisted key-value storage for crawl progress
//!
//! A small SQLite table standing in for the page's local storage. The crawl
//! mirrors its batch of statements here as a JSON array of strings so that an
//! interrupted run can still be dumped.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::error::StorageError;

const CURRENT_STORAGE_VERSION: u32 = 1;

pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at: {}", path.display());

        if let Some(parent) = path.parent() {
            // surfaced by Connection::open below if this fails
            let _ = std::fs::create_dir_all(parent);
        }

        let conn = Connection::open(path).map_err(StorageError::Connection)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::Connection)?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StorageError> {
        let existing_version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if existing_version < CURRENT_STORAGE_VERSION {
            Self::upgrade(&mut conn, existing_version)?;
        }

        Ok(Self { conn })
    }

    fn upgrade(conn: &mut Connection, existing_version: u32) -> Result<(), StorageError> {
        debug!(
            "Upgrading storage from version {} to {}",
            existing_version, CURRENT_STORAGE_VERSION
        );

        if existing_version == 0 {
            let tx = conn.transaction()?;
            tx.pragma_update(None, "user_version", CURRENT_STORAGE_VERSION)?;
            tx.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS local_storage (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
                );
            "#,
            )?;
            tx.commit()?;
        }

        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Overwrite `key` with the JSON encoding of `rows`.
    pub fn save_rows(&self, key: &str, rows: &[String]) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(rows).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.set_item(key, &encoded)?;
        debug!("Persisted {} rows under '{}'", rows.len(), key);
        Ok(())
    }

    /// Rows stored under `key`; a missing key is an empty batch.
    pub fn load_rows(&self, key: &str) -> Result<Vec<String>, StorageError> {
        match self.get_item(key)? {
            Some(encoded) => serde_json::from_str(&encoded).map_err(|source| {
                StorageError::Serialization {
                    key: key.to_string(),
                    source,
                }
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// The dump format: every statement followed by a newline.
pub fn render_dump(rows: &[String]) -> String {
    let mut dump = String::new();
    for row in rows {
        dump.push_str(row);
        dump.push('\n');
    }
    dump
}
