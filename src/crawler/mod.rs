//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - Per-domain and search-channel rate limiting
//! - HTTP fetching with bounded retry
//! - The request frontier and its budget
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod rate_limiter;
mod scheduler;

pub use coordinator::{CrawlOrchestrator, CrawlResult, CrawlSession, CrawlStatus, UrlIssue};
pub use fetcher::{build_http_client, FetchOutcome, FetchWorker, FetchedPage, UserAgentPool};
pub use rate_limiter::{BackoffPolicy, RateLimiter};
pub use scheduler::{CrawlRequest, Frontier, Rejection, LISTING_PRIORITY, SEARCH_PRIORITY};
