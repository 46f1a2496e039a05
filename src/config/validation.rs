use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, RateLimitConfig, SearchConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_search_config(&config.search)?;
    validate_extraction_config(&config.extraction)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be > 0".to_string(),
        ));
    }

    for pattern in &config.skip_domains {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
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
            "crawler_name must contain only alphanumeric characters, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if config.rotation.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agent rotation entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    validate_backoff("rate-limit", config.backoff_factor, config.initial_delay_ms, config.max_delay_ms)
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "search max_retries must be >= 1".to_string(),
        ));
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;

    validate_backoff("search", config.backoff_factor, config.initial_delay_ms, config.max_delay_ms)
}

/// Backoff must never shrink and its cap must admit the first delay
fn validate_backoff(
    section: &str,
    factor: f64,
    initial_delay_ms: u64,
    max_delay_ms: u64,
) -> Result<(), ConfigError> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "{} backoff_factor must be >= 1.0, got {}",
            section, factor
        )));
    }

    if max_delay_ms < initial_delay_ms {
        return Err(ConfigError::Validation(format!(
            "{} max_delay_ms ({}) must be >= initial_delay_ms ({})",
            section, max_delay_ms, initial_delay_ms
        )));
    }

    Ok(())
}

/// Validates thresholds and compiles every pattern once
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    let scores = [
        ("structured_min_confidence", config.structured_min_confidence),
        ("link_min_confidence", config.link_min_confidence),
        ("table_min_confidence", config.table_min_confidence),
        ("free_text_min_confidence", config.free_text_min_confidence),
        ("article_min_confidence", config.article_min_confidence),
        ("structured_base", config.structured_base),
        ("free_text_base", config.free_text_base),
        ("similarity_threshold", config.similarity_threshold),
    ];

    for (name, value) in scores {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0.0 and 1.0, got {}",
                name, value
            )));
        }
    }

    for pattern in config.noise_patterns.iter().chain(&config.listing_patterns) {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("'{}' does not compile: {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    validate_domain_string(pattern.strip_prefix("*.").unwrap_or(pattern))
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is not a well-formed host name",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
