//! Per-domain and per-channel politeness gate
//!
//! Concurrent workers hitting different domains never wait on each other.
//! Workers hitting the same domain are serialized through that domain's
//! own lock, which is created once under a short-lived map lock and then
//! used without touching the map lock again.

use crate::config::{RateLimitConfig, SearchConfig};
use crate::search::SEARCH_CHANNEL;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Last granted acquisition for one key; `None` until the first grant
type Slot = Arc<Mutex<Option<Instant>>>;

/// Exponential backoff schedule: `min(max, initial * factor^(attempt-1))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl BackoffPolicy {
    /// Creates a policy from millisecond values
    pub fn from_millis(initial_ms: u64, factor: f64, max_ms: u64) -> Self {
        Self {
            initial: Duration::from_millis(initial_ms),
            factor,
            max: Duration::from_millis(max_ms),
        }
    }

    /// Delay before attempt `attempt + 1`; attempt 0 has no delay
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.factor.powi(exponent);

        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl From<&RateLimitConfig> for BackoffPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::from_millis(
            config.initial_delay_ms,
            config.backoff_factor,
            config.max_delay_ms,
        )
    }
}

impl From<&SearchConfig> for BackoffPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self::from_millis(
            config.initial_delay_ms,
            config.backoff_factor,
            config.max_delay_ms,
        )
    }
}

/// Thread-safe rate limiter shared by every fetch worker
///
/// Domain keys and channel keys live in separate maps so a domain can never
/// collide with a channel name such as `"search"`.
pub struct RateLimiter {
    min_interval: Duration,
    search_interval: Duration,
    max_retries: u32,
    backoff: BackoffPolicy,
    domains: RwLock<HashMap<String, Slot>>,
    channels: RwLock<HashMap<String, Slot>>,
}

impl RateLimiter {
    /// Creates a rate limiter from the `[rate-limit]` configuration section
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            search_interval: Duration::from_millis(config.search_interval_ms),
            max_retries: config.max_retries,
            backoff: BackoffPolicy::from(config),
            domains: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Minimum interval between two requests to one domain
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least the minimum interval has passed since the last
    /// grant for `domain`, then records the new grant
    pub async fn acquire(&self, domain: &str) {
        self.acquire_with_interval(domain, self.min_interval).await;
    }

    /// Like [`acquire`](Self::acquire) but never waits less than `interval`
    ///
    /// Used when robots.txt asks for a longer crawl delay than configured.
    pub async fn acquire_with_interval(&self, domain: &str, interval: Duration) {
        let interval = interval.max(self.min_interval);
        let slot = slot_for(&self.domains, domain);
        wait_and_mark(&slot, interval).await;
    }

    /// Same semantics as [`acquire`](Self::acquire) keyed by a fixed channel
    /// name; the `"search"` channel uses the search interval
    pub async fn acquire_global(&self, channel: &str) {
        let interval = if channel == SEARCH_CHANNEL {
            self.search_interval
        } else {
            self.min_interval
        };
        let slot = slot_for(&self.channels, channel);
        wait_and_mark(&slot, interval).await;
    }

    /// Delay before the next attempt after `attempt` failed ones
    pub fn next_backoff(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Returns true while `attempt` is below the configured retry count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Number of domains seen so far
    pub fn tracked_domains(&self) -> usize {
        self.domains.read().len()
    }
}

/// Returns the slot for `key`, creating it under the write lock on first use
fn slot_for(map: &RwLock<HashMap<String, Slot>>, key: &str) -> Slot {
    if let Some(slot) = map.read().get(key) {
        return Arc::clone(slot);
    }

    let mut guard = map.write();
    Arc::clone(
        guard
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None))),
    )
}

async fn wait_and_mark(slot: &Slot, interval: Duration) {
    let mut last = slot.lock().await;
    if let Some(previous) = *last {
        let elapsed = previous.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
    *last = Some(Instant::now());
}
