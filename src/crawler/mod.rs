//! Crawler module for exploring the category ID space
//!
//! This module contains the core exploration logic, including:
//! - HTTP fetching with per-target timeouts
//! - HTML extraction of categories, landing-page seeds and product details
//! - Cadence and backoff scheduling
//! - Overall run coordination

mod coordinator;
mod enricher;
mod fetcher;
mod parser;
mod scheduler;
mod traits;

pub use coordinator::{Collaborators, Explorer, RunSummary};
pub(crate) use coordinator::write_snapshot;
pub use enricher::{EnrichError, Enricher};
pub use fetcher::{build_http_client, classify_status, HttpPageFetcher};
pub use parser::{parse_price, parse_reviews, HtmlExtractor};
pub use scheduler::Scheduler;
pub use traits::{
    CategoryExtractor, DetailExtractor, ExtractedCategory, FetchResult, FetchTarget, FetchedPage,
    PageFetcher, SeedCategory,
};
