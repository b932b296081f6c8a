use crate::config::types::{
    Config, CrawlerConfig, LinkEntry, OutputConfig, ScheduleConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_schedule_config(&config.schedule)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_links(&config.links)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // concurrency <= 0 is accepted and falls back to the default worker count

    if config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be at most 100, got {}",
            config.concurrency
        )));
    }

    if config.probe_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "probe_timeout_seconds must be >= 1".to_string(),
        ));
    }

    if config.rss_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "rss_timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates job cadences
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    for (name, hours) in [
        ("crawl_interval_hours", config.crawl_interval_hours),
        ("recovery_interval_hours", config.recovery_interval_hours),
    ] {
        if hours == 0 {
            return Err(ConfigError::Validation(format!("{} must be >= 1", name)));
        }
    }

    if !(1..=3).contains(&config.ingest_interval_hours) {
        return Err(ConfigError::Validation(format!(
            "ingest_interval_hours must be between 1 and 3, got {}",
            config.ingest_interval_hours
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates bootstrap links
fn validate_links(links: &[LinkEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for link in links {
        if link.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Link {} has an empty name",
                link.url
            )));
        }

        validate_http_url(&link.url)?;

        if !seen.insert(link.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate link url: {}",
                link.url
            )));
        }

        if !link.email.is_empty() {
            validate_email(&link.email)?;
        }
    }

    Ok(())
}

/// Validates that a string is an absolute http(s) URL
fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid link url '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Link url must use http or https: '{}'",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Link url has no host: '{}'",
            raw
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
