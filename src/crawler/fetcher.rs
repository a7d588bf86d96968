//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the explorer, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for category listings and product pages
//! - Per-target timeouts
//! - Classification of responses into found / not found / failed

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::crawler::traits::{FetchResult, FetchTarget, FetchedPage, PageFetcher};
use crate::ScoutError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use bestseller_scout::config::UserAgentConfig;
/// use bestseller_scout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "BestsellerScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a response status to a fetch outcome, `None` meaning "read the body"
///
/// | Status | Outcome |
/// |--------|---------|
/// | 2xx | read body → Found |
/// | 404, 410 | NotFound |
/// | anything else | Failed |
pub fn classify_status(status: StatusCode) -> Option<FetchResult> {
    if status.is_success() {
        return None;
    }

    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Some(FetchResult::NotFound);
    }

    Some(FetchResult::Failed {
        error: format!("HTTP {}", status.as_u16()),
    })
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::Failed { error }
}

/// Page fetcher backed by a shared `reqwest` client
pub struct HttpPageFetcher {
    client: Client,
    listing_url: String,
    category_timeout: Duration,
    detail_timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(fetcher: &FetcherConfig, user_agent: &UserAgentConfig) -> Result<Self, ScoutError> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            listing_url: fetcher.listing_url.clone(),
            category_timeout: Duration::from_secs(fetcher.timeout_secs),
            detail_timeout: Duration::from_secs(fetcher.detail_timeout_secs),
        })
    }

    /// URL requested for a target
    pub fn target_url(&self, target: &FetchTarget) -> String {
        match target {
            FetchTarget::Category(id) => format!("{}{}", self.listing_url, id),
            FetchTarget::Url(url) => url.clone(),
        }
    }

    fn timeout_for(&self, target: &FetchTarget) -> Duration {
        match target {
            FetchTarget::Category(_) => self.category_timeout,
            FetchTarget::Url(_) => self.detail_timeout,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn connect(&self) -> Result<(), ScoutError> {
        // Any HTTP answer proves the site is reachable
        match self
            .client
            .get(&self.listing_url)
            .timeout(self.category_timeout)
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!(
                    "Listing endpoint {} answered {}",
                    self.listing_url,
                    response.status()
                );
                Ok(())
            }
            Err(e) if e.is_connect() || e.is_builder() => Err(ScoutError::FetcherUnavailable(
                format!("{}: {}", self.listing_url, e),
            )),
            Err(e) => {
                tracing::warn!("Connectivity check against {} failed: {}", self.listing_url, e);
                Ok(())
            }
        }
    }

    async fn fetch(&self, target: &FetchTarget) -> FetchResult {
        let url = self.target_url(target);

        let response = match self
            .client
            .get(&url)
            .timeout(self.timeout_for(target))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        if let Some(outcome) = classify_status(response.status()) {
            return outcome;
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(body) => FetchResult::Found(FetchedPage { final_url, body }),
            Err(e) => classify_error(&e),
        }
    }
}
