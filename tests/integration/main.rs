//! Integration tests for bestseller-scout
//!
//! `explore_tests` drives whole runs against wiremock servers and scripted
//! fetchers; `api_tests` exercises the read, status and control handlers.

mod api_tests;
mod explore_tests;

use async_trait::async_trait;
use bestseller_scout::catalog::CatalogSnapshot;
use bestseller_scout::config::{
    Config, ExplorerConfig, FetcherConfig, StorageBackend, StorageConfig, UserAgentConfig,
};
use bestseller_scout::crawler::{
    Collaborators, FetchResult, FetchTarget, HtmlExtractor, PageFetcher,
};
use bestseller_scout::job::{JobController, Supervisor};
use bestseller_scout::storage::{SnapshotStore, SqliteStore, StorageResult};
use std::sync::{Arc, Mutex};

/// Creates a test configuration pointing at `listing_url`
pub fn create_test_config(listing_url: &str, store_path: &str, upper_bound: u32) -> Config {
    Config {
        explorer: ExplorerConfig {
            upper_bound,
            backoff_cooldown_ms: 1, // Very short for testing
            error_delay_ms: 1,
            ..ExplorerConfig::default()
        },
        fetcher: FetcherConfig {
            listing_url: listing_url.to_string(),
            timeout_secs: 5,
            detail_timeout_secs: 5,
            product_id_prefix: "MLA".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Json,
            path: store_path.to_string(),
        },
    }
}

/// Answers every target as not found and records what was asked
#[derive(Default)]
pub struct EmptySite {
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl PageFetcher for EmptySite {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult {
        self.requested.lock().unwrap().push(target.as_str().to_string());
        FetchResult::NotFound
    }
}

/// Collaborators built around an arbitrary fetcher and the HTML extractor
pub fn collaborators_with(fetcher: Arc<dyn PageFetcher>) -> Collaborators {
    let html = Arc::new(HtmlExtractor::new("MLA").unwrap());
    Collaborators {
        fetcher,
        categories: html.clone(),
        details: html,
    }
}

pub fn controller_for(
    store: Arc<dyn SnapshotStore>,
    collaborators: Collaborators,
    explorer: ExplorerConfig,
) -> JobController {
    JobController::new(store, collaborators, explorer, Arc::new(Supervisor::new()))
}

/// In-memory store recording `lastExploredId` of every write, in write order
pub struct RecordingStore {
    inner: SqliteStore,
    pub written: Mutex<Vec<Option<u32>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            written: Mutex::new(Vec::new()),
        }
    }
}

impl SnapshotStore for RecordingStore {
    fn read(&self) -> StorageResult<Option<CatalogSnapshot>> {
        self.inner.read()
    }

    fn save(&self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        self.written.lock().unwrap().push(snapshot.last_explored_id);
        self.inner.save(snapshot)
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(Option<CatalogSnapshot>) -> Option<CatalogSnapshot>,
    ) -> StorageResult<Option<CatalogSnapshot>> {
        // Recorded inside the inner transaction so the order is the write order
        self.inner.update(&mut |current| {
            let next = apply(current);
            if let Some(snapshot) = &next {
                self.written.lock().unwrap().push(snapshot.last_explored_id);
            }
            next
        })
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}
