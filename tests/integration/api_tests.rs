//! Read, status and control handlers over a real store

use crate::{collaborators_with, controller_for, create_test_config, EmptySite};
use bestseller_scout::api::{handle_control, handle_read, handle_status};
use bestseller_scout::storage::{JsonFileStore, SnapshotStore, SqliteStore};
use bestseller_scout::CatalogSnapshot;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_first_read_bootstraps_and_starts_run() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(dir.path().join("catalog.json")));
    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 20);
    let controller = controller_for(store.clone(), collaborators_with(site.clone()), config.explorer);

    let snapshot = handle_read(&controller).await.unwrap();
    assert!(snapshot.job_in_progress);
    assert!(!snapshot.job_complete);
    assert!(snapshot.data.is_empty());
    assert!(controller.supervisor().is_running());

    controller.supervisor().wait().await.unwrap().unwrap();
    assert_eq!(site.requested.lock().unwrap().len(), 20);

    // Later reads return the stored document without starting anything
    let stored = handle_read(&controller).await.unwrap();
    assert!(stored.job_complete);
    assert_eq!(stored.last_explored_id, Some(20));
    assert!(!controller.supervisor().is_running());
}

#[tokio::test]
async fn test_control_rejects_unknown_action() {
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let config = create_test_config("http://unused.invalid/", "unused", 20);
    let controller = controller_for(
        store.clone(),
        collaborators_with(Arc::new(EmptySite::default())),
        config.explorer,
    );

    let err = handle_control(&controller, r#"{"action":"stop"}"#)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    // Nothing was started or written
    assert!(!controller.supervisor().is_running());
    assert!(store.read().unwrap().is_none());
}

#[tokio::test]
async fn test_control_force_then_status() {
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let config = create_test_config("http://unused.invalid/", "unused", 9999);
    let controller = controller_for(
        store,
        collaborators_with(Arc::new(EmptySite::default())),
        config.explorer,
    );

    let response = handle_control(&controller, r#"{"action":"force"}"#)
        .await
        .unwrap();
    assert!(response.success);

    // The flag is persisted before the control call returns
    let status = handle_status(&controller).await.unwrap();
    assert!(status.in_progress);
    assert!(!status.complete);

    controller.supervisor().wait().await.unwrap().unwrap();

    let status = handle_status(&controller).await.unwrap();
    assert!(!status.in_progress);
    assert!(status.complete);
    assert_eq!(status.last_explored_id, Some(9999));
    assert_eq!(status.progress, Some(100));

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["inProgress"], false);
    assert_eq!(json["categoriesFound"], 0);
}

#[tokio::test]
async fn test_control_resume_on_completed_catalog() {
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut done = CatalogSnapshot::empty();
    done.mark_completed(50, 1234);
    store.save(&done).unwrap();

    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 50);
    let controller = controller_for(store.clone(), collaborators_with(site.clone()), config.explorer);

    let response = handle_control(&controller, r#"{"action":"resume","fromId":41}"#)
        .await
        .unwrap();
    assert!(response.success);
    controller.supervisor().wait().await.unwrap().unwrap();

    let requested = site.requested.lock().unwrap().clone();
    assert_eq!(requested.first().map(String::as_str), Some("MLA0041"));
    assert_eq!(requested.len(), 10);

    let snapshot = store.read().unwrap().unwrap();
    assert!(snapshot.job_complete);
    assert_eq!(snapshot.last_explored_id, Some(50));
}

/// Layout written by earlier versions: legacy flag names and an empty seller
const LEGACY_DOCUMENT: &str = r#"{
  "timestamp": "2024-05-01T12:00:00.000Z",
  "totalCategories": 1,
  "categoriesWithProducts": 1,
  "totalProducts": 1,
  "executionTimeMs": 5000,
  "data": [
    {
      "id": "MLA1051",
      "name": "Celulares y Teléfonos",
      "productCount": 1,
      "products": [
        {
          "id": "MLA111",
          "name": "Phone One",
          "price": 249999,
          "link": "https://example.com/p/MLA111-phone",
          "rating": "4.7",
          "condition": "Nuevo",
          "seller": {},
          "category": "Celulares y Teléfonos",
          "categoryId": "MLA1051"
        }
      ]
    }
  ],
  "backgroundUpdateInProgress": false,
  "backgroundUpdateComplete": true,
  "lastExploredId": 5
}"#;

#[tokio::test]
async fn test_legacy_document_survives_forced_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, LEGACY_DOCUMENT).unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&path));

    let before = store.load().expect("legacy document must load");
    assert_eq!(before.total_categories, 1);
    assert!(before.job_complete);
    assert_eq!(before.data[0].products[0].seller, None);

    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 20);
    let controller = controller_for(store.clone(), collaborators_with(site.clone()), config.explorer);

    assert!(controller.force_start().await.unwrap());
    controller.supervisor().wait().await.unwrap().unwrap();
    assert_eq!(site.requested.lock().unwrap().len(), 15);

    let after = store.read().unwrap().unwrap();
    assert!(after.job_complete);
    assert_eq!(after.last_explored_id, Some(20));
    assert_eq!(after.total_categories, 1);
    assert_eq!(after.total_products, 1);
    let product = &after.category("MLA1051").unwrap().products[0];
    assert_eq!(product.condition.as_deref(), Some("Nuevo"));
    assert_eq!(product.seller, None);

    // The rewritten document drops the empty seller and uses the current flag names
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["totalCategories"], 1);
    assert_eq!(raw["jobComplete"], true);
    assert!(raw["data"][0]["products"][0].get("seller").is_none());
}

#[tokio::test]
async fn test_unparseable_document_is_set_aside_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, r#"{"data": "not a list"}"#).unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&path));

    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 3);
    let controller = controller_for(store.clone(), collaborators_with(site), config.explorer);

    assert!(controller.force_start().await.unwrap());
    controller.supervisor().wait().await.unwrap().unwrap();

    let kept: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("catalog.json.corrupt-"))
        .collect();
    assert_eq!(kept.len(), 1);
    let original = std::fs::read_to_string(dir.path().join(&kept[0])).unwrap();
    assert!(original.contains("not a list"));

    assert!(store.read().unwrap().unwrap().job_complete);
}
