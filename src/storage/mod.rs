//! Storage module for persisting the catalog snapshot
//!
//! The snapshot is a single document. Two backends are available:
//! - a JSON file replaced atomically on every write
//! - a SQLite key-value table holding the same JSON document

mod json_file;
mod schema;
mod sqlite;
mod traits;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;
pub use traits::{SnapshotStore, StorageError, StorageResult};

use crate::config::{StorageBackend, StorageConfig};
use crate::ScoutError;

use std::path::Path;
use std::sync::Arc;

/// Opens the snapshot store described by the configuration
///
/// # Arguments
///
/// * `config` - Storage section of the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn SnapshotStore>)` - Store ready to be shared between tasks
/// * `Err(ScoutError)` - Failed to open the backend
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn SnapshotStore>, ScoutError> {
    let path = Path::new(&config.path);
    let store: Arc<dyn SnapshotStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(path)),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(path)?),
    };
    tracing::debug!("Opened snapshot store at {}", store.describe());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_selects_backend() {
        let dir = TempDir::new().unwrap();

        let json = open_store(&StorageConfig {
            backend: StorageBackend::Json,
            path: dir.path().join("catalog.json").display().to_string(),
        })
        .unwrap();
        json.save(&CatalogSnapshot::empty()).unwrap();
        assert!(dir.path().join("catalog.json").exists());

        let sqlite = open_store(&StorageConfig {
            backend: StorageBackend::Sqlite,
            path: dir.path().join("catalog.db").display().to_string(),
        })
        .unwrap();
        assert!(sqlite.describe().starts_with("sqlite:"));
        assert!(sqlite.read().unwrap().is_none());
    }
}
