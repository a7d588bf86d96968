//! Product detail enrichment
//!
//! Fetches the detail page of the top-ranked products of a freshly found
//! category and fills in attributes only available there. Enrichment is best
//! effort: a failed detail fetch leaves the listing record untouched.

use crate::catalog::Product;
use crate::crawler::traits::{DetailExtractor, FetchResult, FetchTarget, PageFetcher};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Why a single product could not be enriched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnrichError {
    #[error("detail page not found: {0}")]
    NotFound(String),

    #[error("detail fetch failed for {link}: {error}")]
    Fetch { link: String, error: String },
}

pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn DetailExtractor>,
    limit: usize,
}

impl Enricher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn DetailExtractor>,
        limit: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            limit,
        }
    }

    /// Fetches one product's detail page and applies what it finds
    pub async fn enrich_product(&self, product: &mut Product) -> Result<(), EnrichError> {
        let target = FetchTarget::Url(product.link.clone());
        match self.fetcher.fetch(&target).await {
            FetchResult::Found(page) => {
                let details = self.extractor.extract_details(&page);
                if details.is_empty() {
                    tracing::debug!("No detail attributes on {}", product.link);
                }
                product.apply_details(details);
                Ok(())
            }
            FetchResult::NotFound => Err(EnrichError::NotFound(product.link.clone())),
            FetchResult::Failed { error } => Err(EnrichError::Fetch {
                link: product.link.clone(),
                error,
            }),
        }
    }

    /// Enriches the first `limit` products that have a link and are not in
    /// `known`, recording enriched ids in `known`
    ///
    /// Returns the number of products enriched. Product order is preserved.
    pub async fn enrich(&self, products: &mut [Product], known: &mut HashSet<String>) -> usize {
        let mut enriched = 0;

        for product in products.iter_mut().take(self.limit) {
            if product.link.is_empty() || known.contains(&product.id) {
                continue;
            }

            match self.enrich_product(product).await {
                Ok(()) => {
                    known.insert(product.id.clone());
                    enriched += 1;
                }
                Err(e) => {
                    tracing::warn!("Keeping listing record for {}: {}", product.id, e);
                }
            }
        }

        enriched
    }
}
