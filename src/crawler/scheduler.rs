//! Crawl requests and the frontier they wait in
//!
//! The frontier is a priority queue (lower priority values are dispatched
//! first) that also enforces the session's request budget and refuses to
//! queue a URL whose normalized form has been queued before.

use crate::state::RequestState;
use crate::url::normalize_url;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Priority given to URLs that came from the search step
pub const SEARCH_PRIORITY: u32 = 0;

/// Base priority for listing pages found during the crawl
pub const LISTING_PRIORITY: u32 = 10;

/// A URL waiting to be fetched, or being fetched
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// The URL to fetch
    pub url: String,

    /// Human-readable origin of the request (search title or link text)
    pub label: String,

    /// Priority value (lower is higher priority)
    pub priority: u32,

    /// GET requests issued so far
    pub attempt_count: u32,

    /// Upper bound for `attempt_count`
    pub max_attempts: u32,

    /// Listing hops from a search result (0 for search results)
    pub depth: u32,

    /// Current position in the request state machine
    pub state: RequestState,
}

impl CrawlRequest {
    /// Creates a queued request at depth 0
    pub fn new(
        url: impl Into<String>,
        label: impl Into<String>,
        priority: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            priority,
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
            depth: 0,
            state: RequestState::Queued,
        }
    }

    /// Sets the listing depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Moves to `next` if the state machine allows it
    ///
    /// # Returns
    ///
    /// * `true` - The state changed
    /// * `false` - The transition is not allowed; the state is unchanged
    pub fn transition(&mut self, next: RequestState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            tracing::warn!(
                "Ignoring invalid transition {} -> {} for {}",
                self.state,
                next,
                self.url
            );
            false
        }
    }
}

// Lower priority values have higher priority (are popped first from BinaryHeap)
impl Ord for CrawlRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.url.cmp(&self.url))
    }
}

impl PartialOrd for CrawlRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CrawlRequest {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.url == other.url
    }
}

impl Eq for CrawlRequest {}

/// Why a request was not added to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Its normalized URL was queued earlier in this session
    Duplicate,
    /// The request budget is spent
    BudgetExhausted,
}

/// Priority queue of pending requests with de-duplication and a budget
pub struct Frontier {
    queue: BinaryHeap<CrawlRequest>,
    seen: HashSet<String>,
    budget: usize,
    admitted: usize,
}

impl Frontier {
    /// Creates an empty frontier that admits at most `budget` requests
    pub fn new(budget: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            budget,
            admitted: 0,
        }
    }

    /// Adds a request unless it is a duplicate or the budget is spent
    ///
    /// Malformed URLs are admitted under their raw text so that the fetcher
    /// can record them as permanent failures.
    pub fn push(&mut self, request: CrawlRequest) -> Result<(), Rejection> {
        let key = normalize_url(&request.url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| request.url.clone());

        if self.seen.contains(&key) {
            return Err(Rejection::Duplicate);
        }
        if self.admitted >= self.budget {
            return Err(Rejection::BudgetExhausted);
        }

        self.seen.insert(key);
        self.admitted += 1;
        self.queue.push(request);
        Ok(())
    }

    /// Removes the highest-priority request
    pub fn pop(&mut self) -> Option<CrawlRequest> {
        self.queue.pop()
    }

    /// Number of requests waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no requests are waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Requests admitted so far, dispatched or not
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Admissions left before the budget is spent
    pub fn remaining_budget(&self) -> usize {
        self.budget.saturating_sub(self.admitted)
    }

    /// Drains every request still waiting
    pub fn drain(&mut self) -> Vec<CrawlRequest> {
        self.queue.drain().collect()
    }
}
