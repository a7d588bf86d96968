//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot stores and
//! associated error types.

use crate::catalog::CatalogSnapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to replace snapshot document: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Store lock poisoned")]
    Lock,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the single `CatalogSnapshot` document
///
/// Writes always replace the whole document, so a concurrent reader sees
/// either the previous or the next version, never a partial one.
/// Implementations must serialise `save` and `update` within the process.
pub trait SnapshotStore: Send + Sync {
    /// Reads the document, reporting missing storage as `Ok(None)`
    fn read(&self) -> StorageResult<Option<CatalogSnapshot>>;

    /// Replaces the whole document
    fn save(&self, snapshot: &CatalogSnapshot) -> StorageResult<()>;

    /// Atomic read-modify-write
    ///
    /// `apply` receives the current document (`None` when absent) and returns
    /// the document to write, or `None` to leave the store untouched. Returns
    /// what was written. A document that no longer parses is moved aside
    /// before `apply` sees `None`, never overwritten in place.
    fn update(
        &self,
        apply: &mut dyn FnMut(Option<CatalogSnapshot>) -> Option<CatalogSnapshot>,
    ) -> StorageResult<Option<CatalogSnapshot>>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// Fail-soft read: corruption or I/O failure is logged and reported as absent
    fn load(&self) -> Option<CatalogSnapshot> {
        match self.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Could not load snapshot from {}: {}", self.describe(), e);
                None
            }
        }
    }
}
