//! HTTP fetcher implementation
//!
//! This module handles every page request made by the crawler:
//! - Building the shared HTTP client
//! - Skip-list and robots.txt checks before any network call
//! - Per-domain rate limiting and User-Agent rotation
//! - Bounded retry with exponential backoff
//! - Error classification into transient and permanent failures

use crate::config::{Config, UserAgentConfig};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::scheduler::CrawlRequest;
use crate::robots::RobotsGate;
use crate::state::RequestState;
use crate::url::{extract_domain, matches_any, origin_key};
use crate::FetchError;
use reqwest::header::{HeaderMap, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, StatusCode};
use scraper::Html;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A successfully fetched page
#[derive(Debug)]
pub struct FetchedPage {
    /// Parsed document; empty when the body was not HTML
    pub document: Html,

    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Response headers
    pub headers: HeaderMap,
}

/// Result of fetching one crawl request
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was fetched and parsed
    Success(FetchedPage),

    /// The page was never requested
    Blocked {
        /// Why the request was refused
        reason: String,
    },

    /// Every permitted attempt failed, or the failure was permanent
    Failed {
        /// The classified error
        error: FetchError,
    },
}

/// Failure of a single attempt, before the retry policy is applied
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptFailure {
    Transient(String),
    Permanent(String),
}

/// Rotating pool of User-Agent header values
///
/// The identity string is always the first entry so the crawler stays
/// identifiable even when rotation is configured.
#[derive(Debug)]
pub struct UserAgentPool {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl UserAgentPool {
    /// Builds the pool from the `[user-agent]` section
    pub fn new(config: &UserAgentConfig) -> Self {
        let mut agents = vec![config.identity()];
        agents.extend(config.rotation.iter().cloned());
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }

    /// Returns the next header value, cycling through the pool
    pub fn next(&self) -> &str {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[index]
    }

    /// Number of distinct header values
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Always false; the identity string is always present
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The full configuration; timeouts come from `[crawler]` and
///   the default User-Agent from `[user-agent]`
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.identity())
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages while honoring politeness rules
pub struct FetchWorker {
    client: Client,
    limiter: Arc<RateLimiter>,
    robots: Arc<RobotsGate>,
    agents: UserAgentPool,
    robots_token: String,
    skip_domains: Vec<String>,
    max_crawl_delay: Duration,
}

impl FetchWorker {
    /// Creates a worker sharing the given client, limiter and robots gate
    pub fn new(
        config: &Config,
        client: Client,
        limiter: Arc<RateLimiter>,
        robots: Arc<RobotsGate>,
    ) -> Self {
        Self {
            client,
            limiter,
            robots,
            agents: UserAgentPool::new(&config.user_agent),
            robots_token: config.user_agent.crawler_name.clone(),
            skip_domains: config.crawler.skip_domains.clone(),
            max_crawl_delay: Duration::from_millis(config.rate_limit.max_delay_ms),
        }
    }

    /// Fetches one request
    ///
    /// # Request Flow
    ///
    /// 1. Parse the URL; a malformed or non-HTTP URL fails permanently
    /// 2. Skip-listed hosts and robots.txt disallows return `Blocked`
    ///    without any request to the page
    /// 3. Wait for the domain's rate limit (raised by any `Crawl-delay`, which
    ///    is capped at `[rate-limit] max-delay-ms`)
    /// 4. GET with a rotated User-Agent
    /// 5. Retry transient failures while both `max_attempts` and the
    ///    limiter's `should_retry` allow it, sleeping the limiter's backoff
    ///    between attempts
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Success |
    /// | 408, 429, 5xx | Retry with backoff |
    /// | Other 4xx | Permanent failure, no retry |
    /// | Timeout / connection error | Retry with backoff |
    /// | Redirect limit exceeded | Permanent failure, no retry |
    ///
    /// `request.attempt_count` is incremented for every GET issued, and each
    /// retry is recorded as a `Fetching -> Fetching` transition.
    pub async fn fetch(&self, request: &mut CrawlRequest) -> FetchOutcome {
        let url = match Url::parse(&request.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return permanent(request, format!("unsupported scheme '{}'", url.scheme()));
            }
            Err(e) => return permanent(request, format!("malformed URL: {}", e)),
        };

        let (Some(host), Some(origin)) = (extract_domain(&url), origin_key(&url)) else {
            return permanent(request, "URL has no host".to_string());
        };

        if matches_any(&self.skip_domains, &host) {
            return FetchOutcome::Blocked {
                reason: format!("{} is on the skip list", host),
            };
        }

        if !self.robots.can_fetch(&url, &self.robots_token).await {
            tracing::debug!("robots.txt disallows {}", url);
            return FetchOutcome::Blocked {
                reason: "disallowed by robots.txt".to_string(),
            };
        }

        let crawl_delay = self.robots.crawl_delay(&url, &self.robots_token).await;
        let interval = self.domain_interval(&host, crawl_delay);

        loop {
            self.limiter.acquire_with_interval(&origin, interval).await;
            request.attempt_count += 1;

            let failure = match self.attempt(&url).await {
                Ok((final_url, status_code, headers, body)) => {
                    let document = parse_body(&headers, &body);
                    return FetchOutcome::Success(FetchedPage {
                        document,
                        final_url,
                        status_code,
                        headers,
                    });
                }
                Err(failure) => failure,
            };

            match failure {
                AttemptFailure::Permanent(message) => return permanent(request, message),
                AttemptFailure::Transient(message) => {
                    if request.attempt_count >= request.max_attempts
                        || !self.limiter.should_retry(request.attempt_count)
                    {
                        return FetchOutcome::Failed {
                            error: FetchError::Transient {
                                url: request.url.clone(),
                                attempts: request.attempt_count,
                                message,
                            },
                        };
                    }

                    let delay = self.limiter.next_backoff(request.attempt_count);
                    tracing::warn!(
                        "attempt {}/{} for {} failed ({}); retrying in {:?}",
                        request.attempt_count,
                        request.max_attempts,
                        request.url,
                        message,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    request.transition(RequestState::Fetching);
                }
            }
        }
    }

    /// Interval between requests to `host`, honoring a capped `Crawl-delay`
    fn domain_interval(&self, host: &str, crawl_delay: Option<Duration>) -> Duration {
        match crawl_delay {
            None => self.limiter.min_interval(),
            Some(delay) if delay > self.max_crawl_delay => {
                tracing::warn!(
                    "{} asks for a crawl delay of {:?}; capping it at {:?}",
                    host,
                    delay,
                    self.max_crawl_delay
                );
                self.max_crawl_delay
            }
            Some(delay) => delay,
        }
    }

    /// Issues one GET and reads the body
    async fn attempt(
        &self,
        url: &Url,
    ) -> Result<(Url, u16, HeaderMap, String), AttemptFailure> {
        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, self.agents.next())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(classify_error)?;

        Ok((final_url, status.as_u16(), headers, body))
    }
}

fn permanent(request: &CrawlRequest, message: String) -> FetchOutcome {
    FetchOutcome::Failed {
        error: FetchError::Permanent {
            url: request.url.clone(),
            message,
        },
    }
}

/// Parses the body as HTML unless the server declared another content type
fn parse_body(headers: &HeaderMap, body: &str) -> Html {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_lowercase();

    if content_type.contains("html") || content_type.contains("xml") {
        Html::parse_document(body)
    } else {
        tracing::debug!("non-HTML content type '{}'; using empty document", content_type);
        Html::new_document()
    }
}

fn classify_status(status: StatusCode) -> AttemptFailure {
    let message = format!("HTTP {}", status.as_u16());
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        AttemptFailure::Transient(message)
    } else if status.is_client_error() {
        AttemptFailure::Permanent(message)
    } else {
        AttemptFailure::Transient(message)
    }
}

fn classify_error(e: reqwest::Error) -> AttemptFailure {
    if e.is_timeout() {
        AttemptFailure::Transient("request timeout".to_string())
    } else if e.is_connect() {
        AttemptFailure::Transient(format!("connection failed: {}", e))
    } else if e.is_redirect() || e.is_builder() {
        AttemptFailure::Permanent(e.to_string())
    } else {
        AttemptFailure::Transient(e.to_string())
    }
}
