//! Catalog data model
//!
//! - `CatalogSnapshot`: the persisted root document
//! - `Category` / `Product`: what exploration discovers
//! - `PartialResult`: a not-yet-persisted batch of discoveries
//! - `IdSpace`: the bounded range of category IDs being scanned
//! - `merge`: folds a partial result into a snapshot

mod id_space;
mod merge;
mod types;

pub use id_space::IdSpace;
pub use merge::merge;
pub use types::{CatalogSnapshot, Category, PartialResult, Product, ProductDetails, Seller};
