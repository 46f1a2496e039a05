//! Robots.txt handling module
//!
//! `RobotsGate` answers "may this URL be fetched?" for every worker. The
//! first query for an origin downloads and caches its robots.txt; later
//! queries for that origin reuse the cached entry until it goes stale.
//! A missing or unreadable robots.txt never blocks a fetch.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::url::origin_key;
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

type Entry = Arc<Mutex<Option<Arc<CachedRobots>>>>;

/// Per-origin cache of robots policies shared by all fetch workers
pub struct RobotsGate {
    client: Client,
    enabled: bool,
    ttl: chrono::Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl RobotsGate {
    /// Creates a gate that fetches robots.txt with the given client
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `enabled` - When false every URL is allowed and nothing is fetched
    pub fn new(client: Client, enabled: bool) -> Self {
        Self {
            client,
            enabled,
            ttl: chrono::Duration::hours(24),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true if robots.txt is being consulted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Checks whether `url` may be fetched by `user_agent`
    ///
    /// # Arguments
    ///
    /// * `url` - The page about to be requested
    /// * `user_agent` - Product token matched against robots.txt groups
    ///
    /// # Returns
    ///
    /// * `true` - Allowed, or robots.txt could not be obtained
    /// * `false` - Disallowed by the origin's robots.txt
    pub async fn can_fetch(&self, url: &Url, user_agent: &str) -> bool {
        if !self.enabled {
            return true;
        }

        match self.entry(url, user_agent).await {
            Some(entry) => entry.is_allowed(url.as_str(), user_agent),
            None => true,
        }
    }

    /// Returns the `Crawl-delay` the origin asks of `user_agent`, if any
    pub async fn crawl_delay(&self, url: &Url, user_agent: &str) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        self.entry(url, user_agent).await?.crawl_delay(user_agent)
    }

    /// Number of origins with a cache slot
    pub fn cached_origins(&self) -> usize {
        self.entries.read().len()
    }

    async fn entry(&self, url: &Url, user_agent: &str) -> Option<Arc<CachedRobots>> {
        let origin = origin_key(url)?;
        let slot = self.slot_for(&origin);

        // Concurrent first queries for one origin wait here and share one download
        let mut cached = slot.lock().await;
        if let Some(entry) = cached.as_ref() {
            if !entry.is_stale(self.ttl) {
                return Some(Arc::clone(entry));
            }
        }

        let policy = fetch_robots(&self.client, url, user_agent).await;
        let entry = Arc::new(CachedRobots::new(policy));
        *cached = Some(Arc::clone(&entry));
        Some(entry)
    }

    fn slot_for(&self, origin: &str) -> Entry {
        if let Some(slot) = self.entries.read().get(origin) {
            return Arc::clone(slot);
        }

        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }
}

/// Fetches robots.txt for the origin of `url`
///
/// # Returns
///
/// * `Some(ParsedRobots)` - A 2xx response body
/// * `None` - Any network error or non-2xx status; treated as allow-all
pub async fn fetch_robots(client: &Client, url: &Url, user_agent: &str) -> Option<ParsedRobots> {
    let robots_url = url.join("/robots.txt").ok()?;

    let response = match client
        .get(robots_url.as_str())
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unavailable at {}: {}", robots_url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned {}; allowing all",
            robots_url,
            response.status()
        );
        return None;
    }

    match response.text().await {
        Ok(body) => Some(ParsedRobots::from_content(&body)),
        Err(e) => {
            tracing::debug!("robots.txt body unreadable at {}: {}", robots_url, e);
            None
        }
    }
}
