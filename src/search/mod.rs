//! Search provider boundary
//!
//! A crawl session starts from the results of one web search. Providers
//! implement [`SearchProvider`]; [`search_with_retry`] wraps any provider in
//! the global search rate limit and a retry loop, and turns a total failure
//! into an empty result list.

mod duckduckgo;
mod ranking;

pub use duckduckgo::DuckDuckGoProvider;
pub use ranking::{hit_priority, relevance};

use crate::config::SearchConfig;
use crate::crawler::{BackoffPolicy, RateLimiter};
use crate::{ScoutError, SearchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rate-limiter channel shared by all search calls
pub const SEARCH_CHANNEL: &str = "search";

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// A web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns at most `max_results` hits for `query`
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Provider that always returns the same hits
///
/// Used when the user supplies URLs directly and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    hits: Vec<SearchHit>,
}

impl StaticProvider {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }

    /// One hit per URL, titled with the URL itself
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Self {
        Self::new(
            urls.iter()
                .map(|u| SearchHit::new(u.as_ref(), u.as_ref(), ""))
                .collect(),
        )
    }

    /// Reads one URL per line; blank lines and `#` comments are skipped
    pub fn from_seed_file(path: &Path) -> Result<Self, ScoutError> {
        let text = std::fs::read_to_string(path)?;
        let urls: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        Ok(Self::from_urls(&urls))
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[async_trait]
impl SearchProvider for StaticProvider {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        if self.hits.len() > max_results {
            tracing::warn!(
                "only the first {} of {} seed URL(s) will be crawled; raise max-results to crawl them all",
                max_results,
                self.hits.len()
            );
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Result count to request when crawling seed URLs instead of searching
///
/// An explicit `--max-results` wins; otherwise the configured value is
/// raised so that every seed is crawled.
pub fn seed_max_results(seeds: &StaticProvider, explicit: Option<usize>, configured: usize) -> usize {
    match explicit {
        Some(n) => n,
        None => configured.max(seeds.len()),
    }
}

/// Runs a search under the global search rate limit, retrying failures
///
/// Errors and empty result pages are retried up to `config.max_retries`
/// attempts, sleeping the `[search]` backoff schedule between attempts.
///
/// # Returns
///
/// The hits of the first non-empty attempt, or an empty list once every
/// attempt has failed. Exhaustion caused by provider rate limiting is logged
/// with its own message.
pub async fn search_with_retry(
    provider: &dyn SearchProvider,
    limiter: &RateLimiter,
    config: &SearchConfig,
    query: &str,
    max_results: usize,
) -> Vec<SearchHit> {
    let policy = BackoffPolicy::from(config);
    let attempts = config.max_retries.max(1);
    let mut last_error: Option<SearchError> = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let delay = policy.delay(attempt - 1);
            tracing::info!(
                "search retry {}/{} in {:?}",
                attempt,
                attempts,
                delay
            );
            tokio::time::sleep(delay).await;
        }

        limiter.acquire_global(SEARCH_CHANNEL).await;
        tracing::info!(
            "searching {} for '{}' (attempt {}/{})",
            provider.name(),
            query,
            attempt,
            attempts
        );

        match provider.search(query, max_results).await {
            Ok(mut hits) if !hits.is_empty() => {
                if hits.len() > max_results {
                    tracing::warn!(
                        "{} returned {} hit(s); keeping the first {}",
                        provider.name(),
                        hits.len(),
                        max_results
                    );
                    hits.truncate(max_results);
                }
                tracing::info!("search returned {} result(s)", hits.len());
                return hits;
            }
            Ok(_) => {
                tracing::warn!("search attempt {} returned no results", attempt);
            }
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::warn!("search attempt {} was rate limited: {}", attempt, e);
                } else {
                    tracing::warn!("search attempt {} failed: {}", attempt, e);
                }
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if e.is_rate_limited() => tracing::error!(
            "search provider is still rate limiting after {} attempts; wait a few minutes before retrying ({})",
            attempts,
            e
        ),
        Some(e) => tracing::error!("search failed after {} attempts: {}", attempts, e),
        None => tracing::warn!("search for '{}' found nothing", query),
    }

    Vec::new()
}
