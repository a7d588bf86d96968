//! Collaborator interfaces used by the explorer
//!
//! The explorer only depends on these traits, so the HTTP fetcher and the
//! HTML extractor can be swapped for scripted implementations in tests.

use crate::catalog::{Product, ProductDetails};
use crate::ScoutError;
use async_trait::async_trait;

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    /// A best-seller listing identified by its category ID
    Category(String),

    /// A page addressed by URL: product details, the landing page or a
    /// seed category listing
    Url(String),
}

impl FetchTarget {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Category(id) => id,
            Self::Url(url) => url,
        }
    }
}

/// A page that was fetched successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// Page body content
    pub body: String,
}

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The target exists
    Found(FetchedPage),

    /// The target has no corresponding entity
    NotFound,

    /// Timeout, network error or unexpected status
    Failed {
        /// Error description
        error: String,
    },
}

/// Retrieves pages for category IDs and product links
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Prepares the fetcher for a run
    ///
    /// An error here aborts the run before any ID is explored.
    async fn connect(&self) -> Result<(), ScoutError> {
        Ok(())
    }

    /// Fetches one target. Never panics and never returns an error: every
    /// failure is classified into a `FetchResult`.
    async fn fetch(&self, target: &FetchTarget) -> FetchResult;
}

/// Category name and product summaries extracted from a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCategory {
    pub name: String,
    pub products: Vec<Product>,
}

/// A category advertised on the landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCategory {
    pub id: String,
    pub name: String,
    /// Absolute URL of the category listing
    pub url: String,
}

/// Turns a listing page into a category
pub trait CategoryExtractor: Send + Sync {
    /// Returns `None` when the page holds no product listing
    fn extract_category(&self, page: &FetchedPage, category_id: &str) -> Option<ExtractedCategory>;

    /// Categories linked from the landing page, in page order
    fn extract_seed_categories(&self, _page: &FetchedPage) -> Vec<SeedCategory> {
        Vec::new()
    }
}

/// Reads detail-only attributes from a product page
pub trait DetailExtractor: Send + Sync {
    fn extract_details(&self, page: &FetchedPage) -> ProductDetails;
}
