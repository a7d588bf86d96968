//! Configuration module for Bestseller-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bestseller_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Exploring up to ID {}", config.explorer.upper_bound);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, ExplorerConfig, FetcherConfig, StorageBackend, StorageConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
