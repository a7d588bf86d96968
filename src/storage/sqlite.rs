//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the SnapshotStore
//! trait. The snapshot is kept as a single JSON document row.

use crate::catalog::CatalogSnapshot;
use crate::storage::schema::{initialize_schema, SNAPSHOT_KEY};
use crate::storage::traits::{SnapshotStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for concurrent readers
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            location: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: None,
        })
    }
}

fn read_document(conn: &Connection) -> StorageResult<Option<CatalogSnapshot>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE key = ?1",
            params![SNAPSHOT_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

/// Renames an unparseable snapshot row so the next write cannot replace it
fn set_aside(conn: &Connection) -> StorageResult<String> {
    let key = format!(
        "{}.corrupt-{}",
        SNAPSHOT_KEY,
        Utc::now().format("%Y%m%dT%H%M%S%3f")
    );
    conn.execute(
        "UPDATE documents SET key = ?1 WHERE key = ?2",
        params![key, SNAPSHOT_KEY],
    )?;
    Ok(key)
}

fn write_document(conn: &Connection, snapshot: &CatalogSnapshot) -> StorageResult<()> {
    let body = serde_json::to_string(snapshot)?;
    conn.execute(
        "INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![SNAPSHOT_KEY, body, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn read(&self) -> StorageResult<Option<CatalogSnapshot>> {
        let conn = self.conn.lock().map_err(|_| StorageError::Lock)?;
        read_document(&conn)
    }

    fn save(&self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Lock)?;
        write_document(&conn, snapshot)
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(Option<CatalogSnapshot>) -> Option<CatalogSnapshot>,
    ) -> StorageResult<Option<CatalogSnapshot>> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Lock)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = match read_document(&tx) {
            Ok(current) => current,
            Err(StorageError::Serialization(e)) => {
                let key = set_aside(&tx)?;
                tracing::warn!("Snapshot row is unreadable ({}), kept as '{}'", e, key);
                None
            }
            Err(e) => return Err(e),
        };

        let written = match apply(current) {
            Some(next) => {
                write_document(&tx, &next)?;
                Some(next)
            }
            None => None,
        };

        tx.commit()?;
        Ok(written)
    }

    fn describe(&self) -> String {
        match &self.location {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".to_string(),
        }
    }
}
