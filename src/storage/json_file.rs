//! JSON document store
//!
//! The snapshot lives in one JSON file. Every write goes to a temporary file
//! in the same directory, is synced, then renamed over the target.

use crate::catalog::CatalogSnapshot;
use crate::storage::traits::{SnapshotStore, StorageError, StorageResult};
use chrono::Utc;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// File-backed snapshot store
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn read_document(&self) -> StorageResult<Option<CatalogSnapshot>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Moves an unparseable document next to itself as `<name>.corrupt-<time>`
    fn set_aside(&self) -> StorageResult<PathBuf> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%3f")));
        let target = self.path.with_file_name(name);
        fs::rename(&self.path, &target)?;
        Ok(target)
    }

    fn write_document(&self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        let dir = self.directory();
        fs::create_dir_all(dir)?;

        let body = serde_json::to_vec(snapshot)?;
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&body)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        Ok(())
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self) -> StorageResult<Option<CatalogSnapshot>> {
        self.read_document()
    }

    fn save(&self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Lock)?;
        self.write_document(snapshot)
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(Option<CatalogSnapshot>) -> Option<CatalogSnapshot>,
    ) -> StorageResult<Option<CatalogSnapshot>> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Lock)?;

        let current = match self.read_document() {
            Ok(current) => current,
            Err(StorageError::Serialization(e)) => {
                let kept = self.set_aside()?;
                tracing::warn!(
                    "Snapshot {} is unreadable ({}), moved to {}",
                    self.path.display(),
                    e,
                    kept.display()
                );
                None
            }
            Err(e) => return Err(e),
        };

        match apply(current) {
            Some(next) => {
                self.write_document(&next)?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
