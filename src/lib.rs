//! Bestseller-Scout: a resumable best-seller catalog explorer
//!
//! This crate walks a bounded numeric ID space of best-seller categories on a
//! remote site, classifies every candidate as found or not found, and merges
//! newly discovered categories and products into a durable snapshot that a
//! separate presentation layer reads. Runs survive interruption and resume
//! from the last persisted position.

pub mod api;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod job;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Bestseller-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Page fetcher unavailable: {0}")]
    FetcherUnavailable(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ExplorerState,
        to: state::ExplorerState,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Bestseller-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{merge, CatalogSnapshot, Category, IdSpace, PartialResult, Product};
pub use config::Config;
pub use job::{JobController, JobStatus, Supervisor};
pub use state::{ExplorerState, JobState};
pub use storage::{JsonFileStore, SnapshotStore, SqliteStore};
