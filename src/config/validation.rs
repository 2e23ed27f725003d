use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the catalog location
///
/// Page numbers are joined onto the catalog URL as a relative path segment,
/// so it must be an absolute http(s) URL ending in `/`.
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.catalog_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid catalog_url '{}': {}",
            config.catalog_url, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "catalog_url '{}' must use http or https",
            config.catalog_url
        )));
    }

    if !url.path().ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "catalog_url '{}' must end with '/'",
            config.catalog_url
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_connection_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_connection_retries must be >= 1, got {}",
            config.max_connection_retries
        )));
    }

    if config.retry_backoff_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms must be >= 1ms, got {}ms",
            config.retry_backoff_ms
        )));
    }

    if config.request_timeout_ms < 1 || config.connect_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1ms, got request {}ms / connect {}ms",
            config.request_timeout_ms, config.connect_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("dest_folder", &config.dest_folder),
        ("json_path", &config.json_path),
        ("pages_dir", &config.pages_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.books_per_page < 1 || config.books_per_row < 1 {
        return Err(ConfigError::Validation(format!(
            "books_per_page and books_per_row must be >= 1, got {} / {}",
            config.books_per_page, config.books_per_row
        )));
    }

    Ok(())
}
