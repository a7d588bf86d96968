//! End-to-end exploration runs
//!
//! These tests use wiremock to serve listing and product pages and check the
//! persisted JSON document after a full run.

use crate::{
    collaborators_with, controller_for, create_test_config, EmptySite, RecordingStore,
};
use bestseller_scout::crawler::{Collaborators, Explorer};
use bestseller_scout::storage::{JsonFileStore, SnapshotStore, SqliteStore};
use bestseller_scout::{CatalogSnapshot, ScoutError};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(base: &str) -> String {
    format!(
        r#"<html>
<head><title>Más vendidos en Celulares | Tienda</title></head>
<body>
  <h1 class="breadcrumb__title">Celulares y Teléfonos</h1>
  <div class="poly-card">
    <div class="poly-card__portada"><img src="https://img.example.com/111.jpg"></div>
    <div class="poly-card__content">
      <span class="poly-component__highlight">1º MÁS VENDIDO</span>
      <a class="poly-component__title" href="{base}/p/MLA111-phone">Phone One</a>
      <span class="andes-money-amount__fraction">249.999</span>
      <span class="poly-reviews__rating">4.7</span>
      <span class="poly-reviews__total">(2.048)</span>
    </div>
  </div>
  <div class="poly-card">
    <div class="poly-card__content">
      <span class="poly-component__highlight">2º MÁS VENDIDO</span>
      <a class="poly-component__title" href="{base}/p/MLA222-phone">Phone Two</a>
      <span class="andes-money-amount__fraction">199.999</span>
    </div>
  </div>
  <div class="poly-card">
    <div class="poly-card__content">
      <a class="poly-component__title" href="{base}/p/MLA111-phone">Phone One again</a>
    </div>
  </div>
</body>
</html>"#
    )
}

const DETAIL_PAGE: &str = r#"<html><body>
  <span class="ui-pdp-subtitle">Nuevo</span>
  <a class="ui-pdp-seller__link-trigger">Tienda Oficial</a>
  <p class="ui-pdp-seller__sales-description">MercadoLíder Platinum</p>
  <figure class="ui-pdp-gallery__figure"><img src="https://img.example.com/111-big.jpg"></figure>
</body></html>"#;

const NO_PRODUCTS_PAGE: &str =
    "<html><head><title>Más vendidos</title></head><body><p>Sin productos</p></body></html>";

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/mas-vendidos/MLA0003"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&server.uri())))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mas-vendidos/MLA0010"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NO_PRODUCTS_PAGE))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/MLA111-phone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/MLA222-phone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_exploration_against_mock_site() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("data").join("catalog.json");
    let config = create_test_config(
        &format!("{}/mas-vendidos/", server.uri()),
        &store_path.display().to_string(),
        12,
    );

    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&store_path));
    let controller = controller_for(
        store,
        Collaborators::http(&config).unwrap(),
        config.explorer.clone(),
    );

    assert!(controller.force_start().await.unwrap());
    let summary = controller.supervisor().wait().await.unwrap().unwrap();

    assert!(summary.completed);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.not_found, 10);
    assert_eq!(summary.enriched, 1);

    // Check the raw persisted layout
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(raw["jobComplete"], true);
    assert_eq!(raw["jobInProgress"], false);
    assert_eq!(raw["lastExploredId"], 12);
    assert_eq!(raw["totalCategories"], 1);
    assert_eq!(raw["categoriesWithProducts"], 1);
    assert_eq!(raw["totalProducts"], 2);

    let category = &raw["data"][0];
    assert_eq!(category["id"], "MLA0003");
    assert_eq!(category["name"], "Celulares y Teléfonos");
    assert_eq!(category["productCount"], 2);

    let first = &category["products"][0];
    assert_eq!(first["id"], "MLA111");
    assert_eq!(first["price"], 249999.0);
    assert_eq!(first["reviewsCount"], 2048);
    assert_eq!(first["categoryId"], "MLA0003");
    assert_eq!(first["condition"], "Nuevo");
    assert_eq!(first["seller"]["name"], "Tienda Oficial");
    // The listing image was already set and is kept
    assert_eq!(first["image"], "https://img.example.com/111.jpg");

    // Failed detail fetch keeps the listing record
    let second = &category["products"][1];
    assert_eq!(second["id"], "MLA222");
    assert!(second.get("seller").is_none());
}

#[tokio::test]
async fn test_unreachable_site_aborts_run() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("catalog.json");
    let config = create_test_config(
        &format!("{}/mas-vendidos/", uri),
        &store_path.display().to_string(),
        12,
    );
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&store_path));
    let controller = controller_for(
        store,
        Collaborators::http(&config).unwrap(),
        config.explorer.clone(),
    );

    assert!(controller.force_start().await.unwrap());
    let outcome = controller.supervisor().wait().await.unwrap();
    assert!(matches!(outcome, Err(ScoutError::FetcherUnavailable(_))));

    let status = controller.status().await.unwrap();
    assert!(!status.in_progress);
    assert!(!status.complete);
}

#[tokio::test]
async fn test_run_to_upper_bound_with_monotonic_progress() {
    let store = Arc::new(RecordingStore::new());
    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 9999);

    let explorer = Explorer::new(
        store.clone(),
        &collaborators_with(site.clone()),
        &config.explorer,
    );
    let summary = explorer.run().await.unwrap();

    assert!(summary.completed);
    assert_eq!(summary.not_found, 9999);
    // A pause after every 501 consecutive misses
    assert_eq!(summary.backoff_pauses, 9999 / 501);

    let snapshot = store.read().unwrap().unwrap();
    assert!(snapshot.job_complete);
    assert!(!snapshot.job_in_progress);
    assert_eq!(snapshot.last_explored_id, Some(9999));

    let written = store.written.lock().unwrap().clone();
    assert!(written.len() > 2);
    let positions: Vec<u32> = written.iter().map(|id| id.unwrap_or(0)).collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress went backwards: {:?}",
        positions
    );
}

#[tokio::test]
async fn test_six_hundred_misses_trigger_one_backoff() {
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 600);

    let summary = Explorer::new(store, &collaborators_with(site.clone()), &config.explorer)
        .run()
        .await
        .unwrap();

    assert_eq!(site.requested.lock().unwrap().len(), 600);
    assert_eq!(summary.backoff_pauses, 1);
}

#[tokio::test]
async fn test_resume_explores_from_requested_id() {
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut snapshot = CatalogSnapshot::empty();
    snapshot.last_explored_id = Some(10);
    store.save(&snapshot).unwrap();

    let site = Arc::new(EmptySite::default());
    let config = create_test_config("http://unused.invalid/", "unused", 600);
    let controller = controller_for(store, collaborators_with(site.clone()), config.explorer);

    assert!(controller.resume(500).await.unwrap());
    controller.supervisor().wait().await.unwrap().unwrap();

    let requested = site.requested.lock().unwrap().clone();
    assert_eq!(requested[0], "MLA0500");
    assert_eq!(requested.len(), 101);
}

fn landing_page() -> &'static str {
    r#"<html><body>
  <div class="dynamic-carousel__container--with-link">
    <h2 class="dynamic__carousel-title">Celulares y Teléfonos</h2>
    <a class="splinter-link dynamic__carousel-link" href="/mas-vendidos/MLA1051">Ver más</a>
  </div>
  <div class="dynamic-carousel__container--with-link">
    <h2 class="dynamic__carousel-title">Computación</h2>
    <a class="splinter-link dynamic__carousel-link" href="/mas-vendidos/MLA1648">Ver más</a>
  </div>
</body></html>"#
}

#[tokio::test]
async fn test_landing_page_seeds_fresh_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mas-vendidos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(landing_page()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mas-vendidos/MLA1051"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&server.uri())))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mas-vendidos/MLA1648"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NO_PRODUCTS_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/MLA111-phone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("catalog.json");
    let mut config = create_test_config(
        &format!("{}/mas-vendidos/", server.uri()),
        &store_path.display().to_string(),
        5,
    );
    config.explorer.seed_url = Some(format!("{}/mas-vendidos", server.uri()));

    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(&store_path));
    let controller = controller_for(
        store,
        Collaborators::http(&config).unwrap(),
        config.explorer.clone(),
    );

    assert!(controller.force_start().await.unwrap());
    let summary = controller.supervisor().wait().await.unwrap().unwrap();

    assert!(summary.completed);
    assert_eq!(summary.seeded, 1);
    assert_eq!(summary.found, 0);
    assert_eq!(summary.not_found, 5);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(raw["totalCategories"], 1);
    assert_eq!(raw["lastExploredId"], 5);

    let category = &raw["data"][0];
    assert_eq!(category["id"], "MLA1051");
    assert_eq!(category["name"], "Celulares y Teléfonos");
    assert_eq!(category["productCount"], 2);
    let first = &category["products"][0];
    assert_eq!(first["categoryId"], "MLA1051");
    assert_eq!(first["category"], "Celulares y Teléfonos");
    assert_eq!(first["seller"]["name"], "Tienda Oficial");
}
