//! Campus-Scout: polite discovery of academic organizations on the web
//!
//! This crate turns a free-text query into a deduplicated, confidence-ranked
//! list of organizations. Search results are crawled under robots.txt and
//! per-domain rate limits, each page is run through several independent
//! extraction strategies, and the candidates are merged once at the end.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod extract;
pub mod intent;
pub mod output;
pub mod robots;
pub mod search;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Campus-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

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

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failure of a single page fetch after the retry policy has been applied
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, connection failure, 5xx or 429; retried with backoff
    #[error("transient failure for {url} after {attempts} attempt(s): {message}")]
    Transient {
        url: String,
        attempts: u32,
        message: String,
    },

    /// 4xx other than 429, or a URL that cannot be requested; never retried
    #[error("permanent failure for {url}: {message}")]
    Permanent { url: String, message: String },
}

impl FetchError {
    /// Returns the URL this error refers to
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }

    /// Returns true if another attempt could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Errors reported by a search provider
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search provider is rate limiting requests: {0}")]
    RateLimited(String),

    #[error("search request failed: {0}")]
    Http(String),

    #[error("could not read search results: {0}")]
    Parse(String),
}

impl SearchError {
    /// Returns true for rate-limit-shaped failures
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// A failure inside one extraction strategy for one page
///
/// These never leave the strategy that produced them; they are logged and
/// the offending block or row is skipped.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid JSON-LD block: {0}")]
    StructuredData(#[from] serde_json::Error),

    #[error("malformed row: {0}")]
    Row(String),

    #[error("unresolvable link '{href}': {message}")]
    Link { href: String, message: String },
}

/// Result type alias for Campus-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlResult, CrawlStatus};
pub use extract::{EntityExtractor, ExtractionMethod, OrganizationCandidate};
pub use state::RequestState;
pub use url::{extract_domain, normalize_url, origin_key};
