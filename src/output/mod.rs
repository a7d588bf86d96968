//! Output module for reporting and exporting the catalog
//!
//! This module handles:
//! - Printing catalog statistics and job status
//! - Exporting the snapshot document as pretty JSON

pub mod stats;

pub use stats::{load_statistics, print_statistics, print_status, CatalogStatistics};

use crate::catalog::CatalogSnapshot;
use crate::ScoutError;
use std::fs;
use std::path::Path;

/// Writes the snapshot to `path` as pretty-printed JSON
///
/// # Arguments
///
/// * `snapshot` - The snapshot to export
/// * `path` - Destination file; parent directories are created
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(ScoutError)` - Serialization or I/O failure
pub fn export_snapshot(snapshot: &CatalogSnapshot, path: &Path) -> Result<(), ScoutError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    tracing::debug!("Exported snapshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use tempfile::TempDir;

    #[test]
    fn test_export_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("catalog.json");

        let mut snapshot = CatalogSnapshot::empty();
        snapshot.data.push(Category::new("MLA0001", "Celulares", vec![]));
        snapshot.recompute_totals();

        export_snapshot(&snapshot, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"totalCategories\": 1"));
        let parsed: CatalogSnapshot = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.data[0].id, "MLA0001");
    }
}
