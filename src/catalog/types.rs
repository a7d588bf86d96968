//! Catalog document types
//!
//! The JSON shape of these types is the persisted layout read by the
//! presentation layer, so field names are camelCase.

use crate::state::JobState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Seller attributes only available on a product's detail page
///
/// Older documents hold `"seller":{}` for detail pages without a seller
/// link, so every field is optional on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<String>,
}

impl Seller {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.reputation.as_deref().map_or(true, |r| r.trim().is_empty())
    }
}

/// Reads a seller, mapping one without any attribute to `None`
fn non_empty_seller<'de, D>(deserializer: D) -> Result<Option<Seller>, D::Error>
where
    D: Deserializer<'de>,
{
    let seller = Option::<Seller>::deserialize(deserializer)?;
    Ok(seller.filter(|s| !s.is_empty()))
}

/// A best-selling product inside one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable external key, unique within its category
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 1-based rank within the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_empty_seller",
        skip_serializing_if = "Option::is_none"
    )]
    pub seller: Option<Seller>,
    /// Display name of the owning category
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_id: String,
}

/// Attributes gathered from a product detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetails {
    pub condition: Option<String>,
    pub seller: Option<Seller>,
    pub image: Option<String>,
}

impl ProductDetails {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.seller.is_none() && self.image.is_none()
    }
}

impl Product {
    /// Returns true if the product has a usable image
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|src| !src.is_empty())
    }

    /// Fills enrichment fields that are still unset
    ///
    /// Values already present are never overwritten.
    pub fn apply_details(&mut self, details: ProductDetails) {
        if self.condition.is_none() {
            self.condition = details.condition;
        }
        if self.seller.is_none() {
            self.seller = details.seller;
        }
        if !self.has_image() {
            if let Some(image) = details.image {
                self.image = Some(image);
            }
        }
    }
}

/// A best-seller category and the products ranked in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// ID drawn from the explored ID space (e.g. "MLA1051")
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_count: usize,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Category {
    /// Builds a category, collapsing duplicate product ids (first seen wins)
    pub fn new(id: impl Into<String>, name: impl Into<String>, products: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let products: Vec<Product> = products
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        Self {
            id: id.into(),
            name: name.into(),
            product_count: products.len(),
            products,
        }
    }

    /// Appends products whose id is not already present, keeping encounter order
    ///
    /// Returns the number of products actually added.
    pub fn union_products(&mut self, incoming: Vec<Product>) -> usize {
        let mut seen: HashSet<String> = self.products.iter().map(|p| p.id.clone()).collect();
        let before = self.products.len();

        for product in incoming {
            if seen.insert(product.id.clone()) {
                self.products.push(product);
            }
        }

        self.product_count = self.products.len();
        self.products.len() - before
    }
}

/// A batch of categories discovered since the last flush
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialResult {
    pub categories: Vec<Category>,
    pub last_explored_id: Option<u32>,
}

impl PartialResult {
    pub fn new(categories: Vec<Category>, last_explored_id: Option<u32>) -> Self {
        Self {
            categories,
            last_explored_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// The complete persisted catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    /// Instant of the last write
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub total_categories: usize,
    #[serde(default)]
    pub categories_with_products: usize,
    #[serde(default)]
    pub total_products: usize,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub data: Vec<Category>,
    #[serde(default, alias = "backgroundUpdateInProgress")]
    pub job_in_progress: bool,
    #[serde(default, alias = "backgroundUpdateComplete")]
    pub job_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_explored_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<DateTime<Utc>>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogSnapshot {
    /// A fresh snapshot: no categories, job never started
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            total_categories: 0,
            categories_with_products: 0,
            total_products: 0,
            execution_time_ms: 0,
            data: Vec::new(),
            job_in_progress: false,
            job_complete: false,
            last_explored_id: None,
            last_updated_timestamp: None,
        }
    }

    /// True until a run has recorded a position or any category
    pub fn is_unexplored(&self) -> bool {
        self.data.is_empty() && self.last_explored_id.is_none()
    }

    /// Snapshot served to readers before anything has been persisted
    pub fn bootstrap() -> Self {
        Self {
            job_in_progress: true,
            ..Self::empty()
        }
    }

    /// Recomputes every derived count from `data`
    pub fn recompute_totals(&mut self) {
        for category in &mut self.data {
            category.product_count = category.products.len();
        }
        self.total_categories = self.data.len();
        self.categories_with_products = self.data.iter().filter(|c| c.product_count > 0).count();
        self.total_products = self.data.iter().map(|c| c.product_count).sum();
    }

    /// Stamps the write instant
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.timestamp = now;
        self.last_updated_timestamp = Some(now);
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.data.iter().find(|c| c.id == id)
    }

    pub fn category_ids(&self) -> HashSet<String> {
        self.data.iter().map(|c| c.id.clone()).collect()
    }

    pub fn product_ids(&self) -> HashSet<String> {
        self.data
            .iter()
            .flat_map(|c| c.products.iter().map(|p| p.id.clone()))
            .collect()
    }

    pub fn job_state(&self) -> JobState {
        JobState::from_flags(self.job_in_progress, self.job_complete)
    }

    /// Marks a run as active
    pub fn mark_started(&mut self) {
        self.job_in_progress = true;
        self.job_complete = false;
        self.touch();
    }

    /// Records progress without ever moving `last_explored_id` backwards
    pub fn record_progress(&mut self, id: u32) {
        self.last_explored_id = Some(self.last_explored_id.map_or(id, |last| last.max(id)));
        self.job_in_progress = true;
        self.job_complete = false;
        self.touch();
    }

    /// Marks the ID space as fully explored
    pub fn mark_completed(&mut self, upper_bound: u32, execution_time_ms: u64) {
        self.job_in_progress = false;
        self.job_complete = true;
        self.last_explored_id = Some(upper_bound);
        self.execution_time_ms = execution_time_ms;
        self.touch();
    }

    /// Marks a run as ended without completing
    pub fn mark_stopped(&mut self) {
        self.job_in_progress = false;
        self.job_complete = false;
        self.touch();
    }
}
