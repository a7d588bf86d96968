use crate::config::types::{Config, ExplorerConfig, FetcherConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_explorer_config(&config.explorer)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates the ID space and scan cadences
fn validate_explorer_config(config: &ExplorerConfig) -> Result<(), ConfigError> {
    if config.id_prefix.is_empty()
        || !config.id_prefix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "id_prefix must be non-empty and alphanumeric, got '{}'",
            config.id_prefix
        )));
    }

    if config.upper_bound < 1 {
        return Err(ConfigError::Validation(
            "upper_bound must be >= 1".to_string(),
        ));
    }

    if config.id_width < 1 || config.id_width > 9 {
        return Err(ConfigError::Validation(format!(
            "id_width must be between 1 and 9, got {}",
            config.id_width
        )));
    }

    let digits = config.upper_bound.to_string().len();
    if digits > config.id_width {
        return Err(ConfigError::Validation(format!(
            "id_width {} cannot hold upper_bound {} ({} digits)",
            config.id_width, config.upper_bound, digits
        )));
    }

    if config.backoff_threshold < 1 {
        return Err(ConfigError::Validation(
            "backoff_threshold must be >= 1".to_string(),
        ));
    }

    if config.progress_every < 1 || config.flush_every_ids < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_every and flush_every_ids must be >= 1, got {} and {}",
            config.progress_every, config.flush_every_ids
        )));
    }

    if let Some(seed_url) = &config.seed_url {
        let url = Url::parse(seed_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "seed_url '{}' must use http or https",
                seed_url
            )));
        }
    }

    if config.flush_every_categories < 1 {
        return Err(ConfigError::Validation(
            "flush_every_categories must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates remote site access configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "listing_url '{}' must use http or https",
            config.listing_url
        )));
    }

    if config.timeout_secs == 0 || config.detail_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch timeouts must be >= 1 second".to_string(),
        ));
    }

    if config.product_id_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "product_id_prefix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// The user agent is sent with every request, so it must identify the
/// crawler and a way to reach its operator
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    let name = config.crawler_name.as_str();
    let name_ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !name_ok {
        return Err(ConfigError::Validation(format!(
            "user-agent crawler-name '{}' must be non-empty ASCII letters, digits or hyphens",
            name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent crawler-version cannot be empty".to_string(),
        ));
    }

    let contact = Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("contact-url '{}': {}", config.contact_url, e)))?;
    if contact.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "contact-url '{}' has no host",
            config.contact_url
        )));
    }

    check_contact_email(&config.contact_email)
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Accepts `local@domain.tld`
fn check_contact_email(email: &str) -> Result<(), ConfigError> {
    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });

    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "user-agent contact-email '{}' is not an email address",
            email
        )))
    }
}
