//! Snapshot merger
//!
//! Folds a [`PartialResult`] into an existing [`CatalogSnapshot`]:
//! categories are unioned by id, products within a category are unioned by
//! id with the first-seen record kept, and every aggregate is recomputed from
//! the merged data. Merging the same partial result twice yields the same
//! snapshot as merging it once.
//!
//! Exploration-state flags and write timestamps are left to the caller.

use crate::catalog::{CatalogSnapshot, Category, PartialResult};
use std::collections::HashMap;

/// Merges `incoming` into `existing`
pub fn merge(existing: CatalogSnapshot, incoming: PartialResult) -> CatalogSnapshot {
    let mut snapshot = existing;

    let mut index: HashMap<String, usize> = snapshot
        .data
        .iter()
        .enumerate()
        .map(|(pos, category)| (category.id.clone(), pos))
        .collect();

    for category in incoming.categories {
        match index.get(&category.id) {
            Some(&pos) => {
                snapshot.data[pos].union_products(category.products);
            }
            None => {
                index.insert(category.id.clone(), snapshot.data.len());
                snapshot
                    .data
                    .push(Category::new(category.id, category.name, category.products));
            }
        }
    }

    if let Some(incoming_last) = incoming.last_explored_id {
        snapshot.last_explored_id = Some(
            snapshot
                .last_explored_id
                .map_or(incoming_last, |last| last.max(incoming_last)),
        );
    }

    snapshot.recompute_totals();
    snapshot
}
