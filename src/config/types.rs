use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Bestseller-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub explorer: ExplorerConfig,
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
}

/// Exploration behavior: the ID space and every cadence of the scan loop
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExplorerConfig {
    /// Fixed prefix of every category ID (e.g. "MLA")
    pub id_prefix: String,

    /// Zero-padded width of the numeric suffix
    pub id_width: usize,

    /// Last ID of the space, inclusive
    pub upper_bound: u32,

    /// Consecutive not-found responses tolerated before cooling down
    pub backoff_threshold: u32,

    /// Cool-down after the backoff threshold is exceeded (milliseconds)
    pub backoff_cooldown_ms: u64,

    /// Status-only progress write every N IDs
    pub progress_every: u32,

    /// Merge buffered categories after N new discoveries
    pub flush_every_categories: usize,

    /// Merge buffered categories every N IDs regardless of discoveries
    pub flush_every_ids: u32,

    /// Top-ranked products per category sent to the detail enricher
    pub detail_limit: usize,

    /// Pause after an unexpected per-ID failure (milliseconds)
    pub error_delay_ms: u64,

    /// Landing page whose carousel lists seed categories, scraped once
    /// before the first ID of a fresh catalog
    pub seed_url: Option<String>,

    /// Top-ranked products per seed category sent to the detail enricher
    pub seed_detail_limit: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            id_prefix: "MLA".to_string(),
            id_width: 4,
            upper_bound: 9999,
            backoff_threshold: 500,
            backoff_cooldown_ms: 30_000,
            progress_every: 10,
            flush_every_categories: 5,
            flush_every_ids: 1000,
            detail_limit: 3,
            error_delay_ms: 1000,
            seed_url: None,
            seed_detail_limit: 5,
        }
    }
}

impl ExplorerConfig {
    pub fn backoff_cooldown(&self) -> Duration {
        Duration::from_millis(self.backoff_cooldown_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

/// Remote site access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Listing URL a category ID is appended to
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Timeout for category listing pages (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for product detail pages (seconds)
    #[serde(rename = "detail-timeout-secs", default = "default_detail_timeout_secs")]
    pub detail_timeout_secs: u64,

    /// Prefix of product IDs embedded in product links
    #[serde(rename = "product-id-prefix", default = "default_product_id_prefix")]
    pub product_id_prefix: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_detail_timeout_secs() -> u64 {
    15
}

fn default_product_id_prefix() -> String {
    "MLA".to_string()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which store holds the snapshot document
    #[serde(default)]
    pub backend: StorageBackend,

    /// JSON document path or SQLite database path
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}
