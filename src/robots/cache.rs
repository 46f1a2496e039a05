//! Robots.txt cache entries
//!
//! An entry remembers what was learned about one origin and when. A `None`
//! policy means robots.txt was missing or unreadable, which allows everything.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// Cached robots.txt outcome for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed policy, or `None` when every path is allowed
    pub policy: Option<ParsedRobots>,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a cache entry stamped with the current time
    pub fn new(policy: Option<ParsedRobots>) -> Self {
        Self {
            policy,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    /// Returns the age of the entry
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Checks if a URL is allowed according to the cached policy
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.policy
            .as_ref()
            .map_or(true, |robots| robots.is_allowed(url, user_agent))
    }

    /// Gets the crawl delay from the cached policy, if any
    pub fn crawl_delay(&self, user_agent: &str) -> Option<std::time::Duration> {
        self.policy.as_ref()?.crawl_delay(user_agent)
    }
}
