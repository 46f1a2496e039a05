//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates a session:
//! - Seeding the frontier from search results
//! - Dispatching requests to a bounded pool of fetch tasks
//! - Running extraction on the task that fetched the page
//! - Re-queueing listing pages for a secondary pass under the budget
//! - Stopping dispatch on cancellation or deadline
//! - Merging all candidates once at the end

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, FetchWorker};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::scheduler::{CrawlRequest, Frontier, Rejection, LISTING_PRIORITY};
use crate::dedup::DeduplicationEngine;
use crate::extract::{ContentItem, EntityExtractor, OrganizationCandidate, PageExtraction};
use crate::intent::{QueryAnalyzer, QueryIntent};
use crate::robots::RobotsGate;
use crate::search::{hit_priority, relevance, search_with_retry, SearchHit, SearchProvider};
use crate::state::RequestState;
use crate::{FetchError, ScoutError};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Why a session ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// At least one organization survived extraction and merging
    Found,

    /// Pages were extracted but no candidate cleared its cutoff
    NoCandidatesAboveThreshold,

    /// Every fetch that was attempted failed
    AllFetchesFailed,

    /// No page was fetched: no URLs, all blocked, or cancelled before dispatch
    NothingToCrawl,
}

impl CrawlStatus {
    /// Human-readable explanation for reports
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Found => "organizations found",
            Self::NoCandidatesAboveThreshold => {
                "0 organizations found: pages were fetched but no candidate met the confidence thresholds"
            }
            Self::AllFetchesFailed => "0 organizations found: every fetch failed",
            Self::NothingToCrawl => "0 organizations found: there was nothing to crawl",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A URL that did not produce an extracted page, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlIssue {
    pub url: String,
    pub reason: String,
}

impl UrlIssue {
    fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Final result of a crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    /// Merged organizations, highest confidence first
    pub organizations: Vec<OrganizationCandidate>,

    /// Links that were not organizations, one entry per target URL
    pub general_content: Vec<ContentItem>,

    /// Requests that ended `Failed`, sorted by URL
    pub failed_urls: Vec<UrlIssue>,

    /// Requests that ended `Blocked`, sorted by URL
    pub blocked_urls: Vec<UrlIssue>,

    /// Requests handed to a fetch task
    pub requests_dispatched: usize,

    /// Pages that reached `Extracted`
    pub pages_extracted: usize,

    /// Candidates produced by all strategies before merging
    pub candidates_found: usize,

    /// Whether dispatch stopped early because of cancellation
    pub cancelled: bool,
}

impl CrawlResult {
    /// Classifies the outcome, separating the different zero-result causes
    pub fn status(&self) -> CrawlStatus {
        if !self.organizations.is_empty() {
            CrawlStatus::Found
        } else if self.pages_extracted > 0 {
            CrawlStatus::NoCandidatesAboveThreshold
        } else if !self.failed_urls.is_empty() {
            CrawlStatus::AllFetchesFailed
        } else {
            CrawlStatus::NothingToCrawl
        }
    }

    /// URLs of failed requests
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.failed_urls.iter().map(|i| i.url.as_str())
    }

    /// URLs of blocked requests
    pub fn blocked(&self) -> impl Iterator<Item = &str> {
        self.blocked_urls.iter().map(|i| i.url.as_str())
    }
}

/// Everything a full session produced
#[derive(Debug)]
pub struct CrawlSession {
    /// The analyzed query
    pub intent: Arc<QueryIntent>,

    /// What the search step returned
    pub hits: Vec<SearchHit>,

    /// The crawl over those hits
    pub result: CrawlResult,
}

/// What happened to one dispatched request
enum PageOutcome {
    Extracted(PageExtraction),
    Blocked(String),
    Failed(FetchError),
}

struct PageReport {
    request: CrawlRequest,
    outcome: PageOutcome,
}

/// Results collected while the crawl is running
#[derive(Default)]
struct Accumulator {
    candidates: Vec<OrganizationCandidate>,
    content: Vec<ContentItem>,
    content_seen: HashSet<String>,
    failed: Vec<UrlIssue>,
    blocked: Vec<UrlIssue>,
    dispatched: usize,
    extracted: usize,
    budget_warned: bool,
}

/// Coordinates fetching, extraction and merging for crawl sessions
pub struct CrawlOrchestrator {
    config: Arc<Config>,
    limiter: Arc<RateLimiter>,
    worker: Arc<FetchWorker>,
    extractor: Arc<EntityExtractor>,
    dedup: DeduplicationEngine,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The frozen session configuration
    /// * `analyzer` - Query analyzer used for intents and free-text entities
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOrchestrator)` - Ready to crawl
    /// * `Err(ScoutError)` - The client could not be built or a pattern is invalid
    pub fn new(config: Arc<Config>, analyzer: Arc<dyn QueryAnalyzer>) -> Result<Self, ScoutError> {
        let client = build_http_client(&config)?;
        Self::with_client(config, client, analyzer)
    }

    /// Creates an orchestrator around an existing HTTP client
    pub fn with_client(
        config: Arc<Config>,
        client: Client,
        analyzer: Arc<dyn QueryAnalyzer>,
    ) -> Result<Self, ScoutError> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let robots = Arc::new(RobotsGate::new(client.clone(), config.crawler.respect_robots));
        let worker = Arc::new(FetchWorker::new(&config, client, limiter.clone(), robots));
        let extractor = Arc::new(EntityExtractor::new(&config, analyzer)?);
        let dedup = DeduplicationEngine::new(&config.extraction);

        Ok(Self {
            config,
            limiter,
            worker,
            extractor,
            dedup,
        })
    }

    /// The rate limiter shared by fetches and the search step
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Builds depth-0 requests from search hits
    ///
    /// Each hit is queued at a priority derived from its relevance to the
    /// intent, so better matches are fetched first.
    pub fn requests_from_hits(&self, hits: &[SearchHit], intent: &QueryIntent) -> Vec<CrawlRequest> {
        hits.iter()
            .map(|hit| {
                let score = relevance(hit, intent);
                tracing::debug!("search hit {} scored {:.2}", hit.url, score);
                CrawlRequest::new(
                    hit.url.clone(),
                    hit.title.clone(),
                    hit_priority(score),
                    self.config.rate_limit.max_retries,
                )
            })
            .collect()
    }

    /// Runs a full session: analyze the query, search, then crawl the hits
    ///
    /// A search that fails completely yields an empty hit list and a
    /// result whose status is `NothingToCrawl`; it is not an error.
    pub async fn run_session(
        &self,
        query: &str,
        provider: &dyn SearchProvider,
        cancel: CancellationToken,
    ) -> CrawlSession {
        let intent = Arc::new(self.extractor.analyzer().analyze(query));
        tracing::info!(
            "query '{}' analyzed as {} intent (domains: {:?}, regions: {:?})",
            query,
            intent.search_intent,
            intent.domain_focus,
            intent.geographic_focus
        );

        let hits = tokio::select! {
            hits = search_with_retry(
                provider,
                &self.limiter,
                &self.config.search,
                query,
                self.config.search.max_results,
            ) => hits,
            _ = cancel.cancelled() => {
                tracing::warn!("cancelled during search");
                Vec::new()
            }
        };

        let result = if hits.is_empty() {
            tracing::warn!("search returned no URLs; nothing to crawl");
            CrawlResult {
                cancelled: cancel.is_cancelled(),
                ..CrawlResult::default()
            }
        } else {
            let requests = self.requests_from_hits(&hits, &intent);
            self.crawl(intent.clone(), requests, cancel).await
        };

        CrawlSession { intent, hits, result }
    }

    /// Crawls a batch of requests and merges everything they yield
    ///
    /// # Crawl Flow
    ///
    /// 1. Admit the batch into the frontier (duplicates and over-budget
    ///    requests are dropped)
    /// 2. Keep up to `max-concurrency` fetch tasks running; each task
    ///    fetches its page and extracts it before returning
    /// 3. As tasks finish, record failures and blocks, collect candidates,
    ///    and queue listing pages while depth and budget allow
    /// 4. On cancellation (or the configured deadline) stop dispatching and
    ///    let running tasks finish
    /// 5. Merge all candidates once
    pub async fn crawl(
        &self,
        intent: Arc<QueryIntent>,
        requests: Vec<CrawlRequest>,
        cancel: CancellationToken,
    ) -> CrawlResult {
        // The deadline must not cancel the caller's token
        let cancel = cancel.child_token();
        let start_time = Instant::now();
        let mut frontier = Frontier::new(self.config.crawler.request_budget);
        let mut acc = Accumulator::default();

        for request in requests {
            let url = request.url.clone();
            if let Err(rejection) = frontier.push(request) {
                tracing::debug!("not queueing {}: {:?}", url, rejection);
            }
        }
        tracing::info!("starting crawl of {} URL(s)", frontier.len());

        let deadline = self.config.crawler.deadline_secs.map(|secs| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::warn!("crawl deadline of {}s reached; draining in-flight requests", secs);
                token.cancel();
            })
        });

        let max_concurrency = self.config.crawler.max_concurrency.max(1);
        let mut tasks: JoinSet<PageReport> = JoinSet::new();
        let mut in_flight: HashSet<String> = HashSet::new();

        loop {
            while tasks.len() < max_concurrency && !cancel.is_cancelled() {
                let Some(mut request) = frontier.pop() else {
                    break;
                };
                request.transition(RequestState::Fetching);
                in_flight.insert(request.url.clone());
                acc.dispatched += 1;

                let worker = self.worker.clone();
                let extractor = self.extractor.clone();
                let intent = intent.clone();
                tasks.spawn(process_request(worker, extractor, intent, request));
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok(report) => {
                    in_flight.remove(&report.request.url);
                    self.record(report, &mut frontier, &mut acc, &cancel);
                }
                Err(e) => tracing::error!("crawl task ended abnormally: {}", e),
            }

            if acc.dispatched % 10 == 0 && !tasks.is_empty() {
                tracing::info!(
                    "Progress: {} dispatched, {} extracted, {} queued, {:.1}s elapsed",
                    acc.dispatched,
                    acc.extracted,
                    frontier.len(),
                    start_time.elapsed().as_secs_f64()
                );
            }
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        // a task that panicked never reported back
        for url in in_flight {
            acc.failed.push(UrlIssue::new(url, "crawl task aborted"));
        }

        let cancelled = cancel.is_cancelled();
        let undispatched = frontier.drain();
        if !undispatched.is_empty() {
            tracing::warn!(
                "{} queued request(s) were not dispatched before cancellation",
                undispatched.len()
            );
        }

        let candidates_found = acc.candidates.len();
        let organizations = self.dedup.merge(acc.candidates);

        acc.failed.sort_by(|a, b| a.url.cmp(&b.url));
        acc.blocked.sort_by(|a, b| a.url.cmp(&b.url));

        tracing::info!(
            "Crawl completed in {:?}: {} page(s) extracted, {} failed, {} blocked, {} candidate(s) merged into {} organization(s)",
            start_time.elapsed(),
            acc.extracted,
            acc.failed.len(),
            acc.blocked.len(),
            candidates_found,
            organizations.len()
        );

        CrawlResult {
            organizations,
            general_content: acc.content,
            failed_urls: acc.failed,
            blocked_urls: acc.blocked,
            requests_dispatched: acc.dispatched,
            pages_extracted: acc.extracted,
            candidates_found,
            cancelled,
        }
    }

    /// Folds one finished request into the accumulator
    fn record(
        &self,
        report: PageReport,
        frontier: &mut Frontier,
        acc: &mut Accumulator,
        cancel: &CancellationToken,
    ) {
        let PageReport { request, outcome } = report;

        match outcome {
            PageOutcome::Extracted(extraction) => {
                acc.extracted += 1;
                tracing::debug!(
                    "extracted {} ({}): {} candidate(s)",
                    request.url,
                    extraction.title.as_deref().unwrap_or("untitled"),
                    extraction.candidates.len()
                );
                acc.candidates.extend(extraction.candidates);

                for item in extraction.content {
                    if item.kind.is_followable() && !cancel.is_cancelled() {
                        self.follow_listing(&request, &item, frontier, acc);
                    }
                    if acc.content_seen.insert(item.url.clone()) {
                        acc.content.push(item);
                    }
                }
            }
            PageOutcome::Blocked(reason) => {
                tracing::info!("blocked {}: {}", request.url, reason);
                acc.blocked.push(UrlIssue::new(request.url, reason));
            }
            PageOutcome::Failed(error) => {
                tracing::warn!("failed {}: {}", request.url, error);
                acc.failed.push(UrlIssue::new(request.url, error.to_string()));
            }
        }
    }

    /// Queues a listing or directory page found on `parent`
    fn follow_listing(
        &self,
        parent: &CrawlRequest,
        item: &ContentItem,
        frontier: &mut Frontier,
        acc: &mut Accumulator,
    ) {
        if parent.depth >= self.config.crawler.max_depth {
            return;
        }

        let follow = CrawlRequest::new(
            item.url.clone(),
            item.title.clone(),
            LISTING_PRIORITY + parent.depth,
            self.config.rate_limit.max_retries,
        )
        .with_depth(parent.depth + 1);

        match frontier.push(follow) {
            Ok(()) => tracing::debug!(
                "queued {} page {} at depth {}",
                item.kind.as_str(),
                item.url,
                parent.depth + 1
            ),
            Err(Rejection::Duplicate) => {}
            Err(Rejection::BudgetExhausted) => {
                if !acc.budget_warned {
                    tracing::info!("request budget spent; not following further listing pages");
                    acc.budget_warned = true;
                }
            }
        }
    }
}

/// Fetches one request and extracts the page on the same task
///
/// Followed listing pages also get the article pass. The parsed document
/// never outlives this call's last await.
async fn process_request(
    worker: Arc<FetchWorker>,
    extractor: Arc<EntityExtractor>,
    intent: Arc<QueryIntent>,
    mut request: CrawlRequest,
) -> PageReport {
    let outcome = match worker.fetch(&mut request).await {
        FetchOutcome::Success(page) => {
            let extraction = if request.depth > 0 {
                extractor.extract_article(&page.document, &page.final_url, &intent)
            } else {
                extractor.extract_page(&page.document, &page.final_url, &intent)
            };
            request.transition(RequestState::Extracted);
            PageOutcome::Extracted(extraction)
        }
        FetchOutcome::Blocked { reason } => {
            request.transition(RequestState::Blocked);
            PageOutcome::Blocked(reason)
        }
        FetchOutcome::Failed { error } => {
            request.transition(RequestState::Failed);
            PageOutcome::Failed(error)
        }
    };

    PageReport { request, outcome }
}
