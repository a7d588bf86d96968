//! Explorer - main exploration loop
//!
//! This module contains the loop that walks the category ID space and
//! coordinates every part of a run, including:
//! - Seeding a fresh catalog from the landing page carousel
//! - Resuming from the last persisted position
//! - Fetching and classifying each candidate ID
//! - Extraction and detail enrichment of found categories
//! - Progress writes, buffered flushes and the backoff policy
//! - Persisting the terminal state

use crate::catalog::{merge, CatalogSnapshot, Category, IdSpace, PartialResult};
use crate::config::{Config, ExplorerConfig};
use crate::crawler::enricher::Enricher;
use crate::crawler::fetcher::HttpPageFetcher;
use crate::crawler::parser::HtmlExtractor;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::traits::{
    CategoryExtractor, DetailExtractor, FetchResult, FetchTarget, PageFetcher,
};
use crate::state::ExplorerState;
use crate::storage::SnapshotStore;
use crate::ScoutError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// The replaceable parts an explorer is built from
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn PageFetcher>,
    pub categories: Arc<dyn CategoryExtractor>,
    pub details: Arc<dyn DetailExtractor>,
}

impl Collaborators {
    /// HTTP fetcher plus HTML extractor, as configured
    pub fn http(config: &Config) -> Result<Self, ScoutError> {
        let html = Arc::new(HtmlExtractor::new(&config.fetcher.product_id_prefix)?);
        Ok(Self {
            fetcher: Arc::new(HttpPageFetcher::new(&config.fetcher, &config.user_agent)?),
            categories: html.clone(),
            details: html,
        })
    }
}

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// First ID of the run
    pub first_id: u32,
    /// IDs walked, including skipped ones
    pub explored: u32,
    /// IDs already present in the snapshot
    pub skipped: u32,
    pub not_found: u32,
    /// Transient fetch failures
    pub failed: u32,
    /// Categories added to the catalog
    pub found: u32,
    /// Pages found without any product
    pub empty: u32,
    pub backoff_pauses: u32,
    /// Products enriched from their detail page
    pub enriched: u32,
    /// Categories taken from the landing page before the walk
    pub seeded: u32,
    /// Periodic flushes that reached the store
    pub flushes: u32,
    pub persistence_failures: u32,
    pub completed: bool,
}

/// Walks the ID space and merges what it finds into the snapshot store
pub struct Explorer {
    store: Arc<dyn SnapshotStore>,
    fetcher: Arc<dyn PageFetcher>,
    categories: Arc<dyn CategoryExtractor>,
    enricher: Enricher,
    seed_url: Option<String>,
    seed_enricher: Enricher,
    id_space: IdSpace,
    scheduler: Scheduler,
    state: ExplorerState,
}

impl Explorer {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        collaborators: &Collaborators,
        config: &ExplorerConfig,
    ) -> Self {
        Self {
            store,
            fetcher: collaborators.fetcher.clone(),
            categories: collaborators.categories.clone(),
            enricher: Enricher::new(
                collaborators.fetcher.clone(),
                collaborators.details.clone(),
                config.detail_limit,
            ),
            seed_url: config.seed_url.clone(),
            seed_enricher: Enricher::new(
                collaborators.fetcher.clone(),
                collaborators.details.clone(),
                config.seed_detail_limit,
            ),
            id_space: IdSpace::from_config(config),
            scheduler: Scheduler::new(config),
            state: ExplorerState::Idle,
        }
    }

    pub fn state(&self) -> ExplorerState {
        self.state
    }

    fn enter(&mut self, to: ExplorerState) -> Result<(), ScoutError> {
        tracing::debug!("Explorer {} -> {}", self.state, to);
        self.state.transition(to)
    }

    /// Runs the exploration until the upper bound of the ID space
    ///
    /// Per-ID failures never abort the run. Only a failure to connect the
    /// fetcher or to open the run in the store does, in which case the job is
    /// marked neither in progress nor complete.
    pub async fn run(mut self) -> Result<RunSummary, ScoutError> {
        let started = Instant::now();
        self.enter(ExplorerState::Running)?;

        if let Err(e) = self.fetcher.connect().await {
            tracing::error!("Page fetcher unavailable, aborting run: {}", e);
            self.abort().await;
            return Err(e);
        }

        let snapshot = match write_snapshot(self.store.clone(), |current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.mark_started();
            Some(snapshot)
        })
        .await
        {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => CatalogSnapshot::empty(),
            Err(e) => {
                tracing::error!("Could not open run in {}: {}", self.store.describe(), e);
                self.abort().await;
                return Err(e);
            }
        };

        let mut known_categories = snapshot.category_ids();
        let mut known_products = snapshot.product_ids();
        let upper = self.id_space.upper_bound();
        let first = self.id_space.start_after(snapshot.last_explored_id);

        let mut summary = RunSummary {
            first_id: first,
            ..RunSummary::default()
        };
        let mut buffer: Vec<Category> = Vec::new();
        let mut pending_progress = JoinSet::new();

        if let Some(seed_url) = self.seed_url.clone().filter(|_| snapshot.is_unexplored()) {
            let seeded = PartialResult::new(
                self.seed(&seed_url, &mut known_categories, &mut known_products, &mut summary)
                    .await,
                None,
            );
            if !seeded.is_empty() {
                let mut batch = Some(seeded.clone());
                let result = write_snapshot(self.store.clone(), move |current| {
                    let batch = batch.take()?;
                    let mut snapshot = merge(current.unwrap_or_default(), batch);
                    snapshot.touch();
                    Some(snapshot)
                })
                .await;
                if let Err(e) = result {
                    // Buffered seeds go out with the next flush or with completion
                    summary.persistence_failures += 1;
                    tracing::error!("Could not persist seed categories: {}", e);
                    buffer.extend(seeded.categories);
                }
            }
        }

        tracing::info!(
            "Exploring {} through {} ({} categories already known)",
            self.id_space.category_id(first),
            self.id_space.category_id(upper),
            known_categories.len()
        );

        for id in first..=upper {
            summary.explored += 1;
            let category_id = self.id_space.category_id(id);

            if known_categories.contains(&category_id) {
                summary.skipped += 1;
            } else {
                self.explore_id(id, &category_id, &mut buffer, &mut known_products, &mut summary)
                    .await?;
            }

            if self.scheduler.should_flush(buffer.len(), id) {
                self.flush(&mut buffer, id, &mut summary).await;
            }

            if self.scheduler.is_progress_point(id) {
                let position = self.durable_position(&buffer, id);
                tracing::info!(
                    "Progress: {}/{} ({}%), {} categories found this run",
                    id,
                    upper,
                    self.id_space.progress_percent(id),
                    summary.found
                );
                let store = self.store.clone();
                pending_progress.spawn(async move {
                    let result = write_snapshot(store, move |current| {
                        let mut snapshot = current.unwrap_or_default();
                        snapshot.record_progress(position);
                        Some(snapshot)
                    })
                    .await;
                    if let Err(e) = result {
                        tracing::error!("Progress write at {} failed: {}", position, e);
                    }
                });
            }
        }

        // Progress writes must land before the terminal state
        while let Some(joined) = pending_progress.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Progress task ended abnormally: {}", e);
            }
        }

        let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut remainder = Some(PartialResult::new(std::mem::take(&mut buffer), Some(upper)));
        let completion = write_snapshot(self.store.clone(), move |current| {
            let remainder = remainder.take()?;
            let mut snapshot = merge(current.unwrap_or_default(), remainder);
            snapshot.mark_completed(upper, execution_time_ms);
            Some(snapshot)
        })
        .await;

        match completion {
            Ok(_) => {
                self.enter(ExplorerState::Completed)?;
                summary.completed = true;
                tracing::info!(
                    "Exploration complete in {}ms: {} found, {} not found, {} failed, {} skipped, {} backoff pauses",
                    execution_time_ms,
                    summary.found,
                    summary.not_found,
                    summary.failed,
                    summary.skipped,
                    summary.backoff_pauses
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Could not persist completed exploration: {}", e);
                self.enter(ExplorerState::Idle)?;
                Err(e)
            }
        }
    }

    /// Fetches and classifies one candidate ID
    async fn explore_id(
        &mut self,
        id: u32,
        category_id: &str,
        buffer: &mut Vec<Category>,
        known_products: &mut HashSet<String>,
        summary: &mut RunSummary,
    ) -> Result<(), ScoutError> {
        tracing::debug!("Exploring {} ({}/{})", category_id, id, self.id_space.upper_bound());

        let page = match self
            .fetcher
            .fetch(&FetchTarget::Category(category_id.to_string()))
            .await
        {
            FetchResult::Found(page) => page,
            FetchResult::NotFound => {
                summary.not_found += 1;
                tracing::debug!("Category {} not found", category_id);
                if self.scheduler.record_not_found() {
                    self.back_off(summary).await?;
                }
                return Ok(());
            }
            FetchResult::Failed { error } => {
                summary.failed += 1;
                tracing::warn!("Skipping {} after fetch failure: {}", category_id, error);
                tokio::time::sleep(self.scheduler.error_delay()).await;
                return Ok(());
            }
        };

        self.scheduler.record_found();

        let extracted = match self.categories.extract_category(&page, category_id) {
            Some(extracted) if !extracted.products.is_empty() => extracted,
            _ => {
                summary.empty += 1;
                tracing::info!("No products found in category {}", category_id);
                return Ok(());
            }
        };

        let mut products = extracted.products;
        for product in &mut products {
            product.category = extracted.name.clone();
            product.category_id = category_id.to_string();
        }

        let enriched = self.enricher.enrich(&mut products, known_products).await;
        summary.enriched += u32::try_from(enriched).unwrap_or(u32::MAX);

        let category = Category::new(category_id, extracted.name, products);
        tracing::info!(
            "Found {} products in {} ({})",
            category.product_count,
            category.name,
            category_id
        );
        summary.found += 1;
        buffer.push(category);

        Ok(())
    }

    /// Explores the categories linked from the landing page carousel
    ///
    /// Seeds without products, and seeds whose page cannot be fetched, are
    /// skipped; the ID walk still covers those inside the ID space.
    async fn seed(
        &self,
        seed_url: &str,
        known_categories: &mut HashSet<String>,
        known_products: &mut HashSet<String>,
        summary: &mut RunSummary,
    ) -> Vec<Category> {
        let landing = match self.fetcher.fetch(&FetchTarget::Url(seed_url.to_string())).await {
            FetchResult::Found(page) => page,
            FetchResult::NotFound => {
                tracing::warn!("Landing page {} not found, no seed categories", seed_url);
                return Vec::new();
            }
            FetchResult::Failed { error } => {
                tracing::warn!("Could not fetch landing page {}: {}", seed_url, error);
                return Vec::new();
            }
        };

        let seeds = self.categories.extract_seed_categories(&landing);
        tracing::info!("{} seed categories on {}", seeds.len(), seed_url);

        let mut categories = Vec::new();
        for seed in seeds {
            if seed.id.is_empty() || seed.name.is_empty() || seed.url.is_empty() {
                continue;
            }
            if known_categories.contains(&seed.id) {
                continue;
            }

            let page = match self.fetcher.fetch(&FetchTarget::Url(seed.url.clone())).await {
                FetchResult::Found(page) => page,
                FetchResult::NotFound => {
                    tracing::debug!("Seed {} not found at {}", seed.id, seed.url);
                    continue;
                }
                FetchResult::Failed { error } => {
                    tracing::warn!("Skipping seed {} after fetch failure: {}", seed.id, error);
                    continue;
                }
            };

            let mut products = match self.categories.extract_category(&page, &seed.id) {
                Some(extracted) if !extracted.products.is_empty() => extracted.products,
                _ => {
                    tracing::info!("No products found in seed {} ({})", seed.name, seed.id);
                    continue;
                }
            };
            for product in &mut products {
                product.category = seed.name.clone();
                product.category_id = seed.id.clone();
            }

            let enriched = self.seed_enricher.enrich(&mut products, known_products).await;
            summary.enriched += u32::try_from(enriched).unwrap_or(u32::MAX);

            known_categories.insert(seed.id.clone());
            let category = Category::new(seed.id, seed.name, products);
            tracing::info!(
                "Seeded {} products from {} ({})",
                category.product_count,
                category.name,
                category.id
            );
            summary.seeded += 1;
            categories.push(category);
        }

        categories
    }

    async fn back_off(&mut self, summary: &mut RunSummary) -> Result<(), ScoutError> {
        tracing::info!(
            "{} consecutive categories not found, pausing for {:?}",
            self.scheduler.consecutive_not_found(),
            self.scheduler.backoff_cooldown()
        );
        self.enter(ExplorerState::PausedOnBackoff)?;
        tokio::time::sleep(self.scheduler.backoff_cooldown()).await;
        self.scheduler.reset_after_backoff();
        summary.backoff_pauses += 1;
        self.enter(ExplorerState::Running)
    }

    /// Merges the buffer into the store; on failure the buffer is kept for the
    /// next flush
    async fn flush(&mut self, buffer: &mut Vec<Category>, id: u32, summary: &mut RunSummary) {
        let mut batch = Some(PartialResult::new(buffer.clone(), Some(id)));
        let result = write_snapshot(self.store.clone(), move |current| {
            let batch = batch.take()?;
            let mut snapshot = merge(current.unwrap_or_default(), batch);
            snapshot.record_progress(id);
            Some(snapshot)
        })
        .await;

        match result {
            Ok(written) => {
                if let Some(snapshot) = written {
                    tracing::info!(
                        "Snapshot updated through {}: {} categories, {} products",
                        self.id_space.category_id(id),
                        snapshot.total_categories,
                        snapshot.total_products
                    );
                }
                buffer.clear();
                summary.flushes += 1;
                self.scheduler.record_flush_success();
            }
            Err(e) => {
                summary.persistence_failures += 1;
                self.scheduler.record_flush_failure(buffer.len());
                tracing::error!(
                    "Flush at {} failed, keeping {} buffered categories: {}",
                    self.id_space.category_id(id),
                    buffer.len(),
                    e
                );
            }
        }
    }

    /// Highest ID whose outcome is fully persisted once the buffer is flushed
    ///
    /// Resuming from a progress write must not skip buffered categories.
    fn durable_position(&self, buffer: &[Category], id: u32) -> u32 {
        buffer
            .iter()
            .filter_map(|c| self.id_space.parse(&c.id))
            .min()
            .map_or(id, |first| first.saturating_sub(1).min(id))
    }

    /// Ends a run that could not start
    async fn abort(&mut self) {
        let result = write_snapshot(self.store.clone(), |current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.mark_stopped();
            Some(snapshot)
        })
        .await;
        if let Err(e) = result {
            tracing::error!("Could not release job flag: {}", e);
        }
        if let Err(e) = self.enter(ExplorerState::Idle) {
            tracing::warn!("{}", e);
        }
    }
}

/// Runs an atomic read-modify-write on the blocking pool
pub(crate) async fn write_snapshot<F>(
    store: Arc<dyn SnapshotStore>,
    mut apply: F,
) -> Result<Option<CatalogSnapshot>, ScoutError>
where
    F: FnMut(Option<CatalogSnapshot>) -> Option<CatalogSnapshot> + Send + 'static,
{
    tokio::task::spawn_blocking(move || store.update(&mut apply))
        .await
        .map_err(|e| ScoutError::Task(e.to_string()))?
        .map_err(ScoutError::from)
}
