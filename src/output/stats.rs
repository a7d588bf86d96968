//! Statistics generation from the catalog snapshot
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics and job status for the command line.

use crate::catalog::CatalogSnapshot;
use crate::job::JobStatus;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    pub total_categories: usize,
    pub categories_with_products: usize,
    pub total_products: usize,

    /// Products that received detail-page attributes
    pub enriched_products: usize,

    /// Products without a usable image
    pub products_without_image: usize,

    /// Largest categories by product count, descending
    pub top_categories: Vec<(String, usize)>,

    pub last_explored_id: Option<u32>,
    pub execution_time_ms: u64,
}

/// Computes statistics from a snapshot
///
/// # Arguments
///
/// * `snapshot` - The snapshot to summarise
/// * `top` - How many of the largest categories to list
pub fn load_statistics(snapshot: &CatalogSnapshot, top: usize) -> CatalogStatistics {
    let products = snapshot.data.iter().flat_map(|c| c.products.iter());

    let mut enriched_products = 0;
    let mut products_without_image = 0;
    for product in products {
        if product.condition.is_some() || product.seller.is_some() {
            enriched_products += 1;
        }
        if !product.has_image() {
            products_without_image += 1;
        }
    }

    let mut top_categories: Vec<(String, usize)> = snapshot
        .data
        .iter()
        .map(|c| (format!("{} ({})", c.name, c.id), c.product_count))
        .collect();
    top_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_categories.truncate(top);

    CatalogStatistics {
        total_categories: snapshot.total_categories,
        categories_with_products: snapshot.categories_with_products,
        total_products: snapshot.total_products,
        enriched_products,
        products_without_image,
        top_categories,
        last_explored_id: snapshot.last_explored_id,
        execution_time_ms: snapshot.execution_time_ms,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Categories: {}", stats.total_categories);
    println!("  Categories with products: {}", stats.categories_with_products);
    println!("  Products: {}", stats.total_products);
    match stats.last_explored_id {
        Some(last) => println!("  Last explored ID: {}", last),
        None => println!("  Last explored ID: -"),
    }
    println!("  Last run duration: {}ms", stats.execution_time_ms);
    println!();

    let enriched_rate = if stats.total_products > 0 {
        (stats.enriched_products as f64 / stats.total_products as f64) * 100.0
    } else {
        0.0
    };
    println!("Products:");
    println!(
        "  With detail attributes: {} ({:.1}%)",
        stats.enriched_products, enriched_rate
    );
    println!("  Without image: {}", stats.products_without_image);
    println!();

    if !stats.top_categories.is_empty() {
        println!("Largest Categories:");
        for (name, count) in &stats.top_categories {
            println!("  - {}: {}", name, count);
        }
        println!();
    }
}

/// Prints the job status
pub fn print_status(status: &JobStatus) {
    let state = if status.in_progress {
        "in progress"
    } else if status.complete {
        "complete"
    } else {
        "idle"
    };

    println!("=== Exploration Status ===\n");
    println!("  State: {}", state);
    println!("  Categories found: {}", status.categories_found);
    match (status.last_explored_id, status.progress) {
        (Some(last), Some(progress)) => {
            println!("  Last explored ID: {} ({}%)", last, progress)
        }
        _ => println!("  Last explored ID: -"),
    }
}
