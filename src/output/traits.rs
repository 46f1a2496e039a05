//! Output sink trait and the run metadata handed to every sink

use crate::crawler::CrawlResult;
use crate::intent::QueryIntent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata about one session, recorded next to its results
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The user's query
    pub query: String,

    /// Detected search intent
    pub search_intent: String,

    /// Subjects found in the query
    pub domain_focus: Vec<String>,

    /// Regions found in the query
    pub geographic_focus: Vec<String>,

    /// SHA-256 of the config file, if one was loaded
    pub config_hash: Option<String>,

    /// Number of URLs the search step returned
    pub search_hits: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Starts a report for `intent`, stamped with the current time
    pub fn new(intent: &QueryIntent, config_hash: Option<String>) -> Self {
        Self {
            query: intent.query.clone(),
            search_intent: intent.search_intent.to_string(),
            domain_focus: intent.domain_focus.clone(),
            geographic_focus: intent.geographic_focus.clone(),
            config_hash,
            search_hits: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Sets the start time
    pub fn started(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }

    /// Records the number of search hits
    pub fn with_search_hits(mut self, hits: usize) -> Self {
        self.search_hits = hits;
        self
    }

    /// Stamps the finish time
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Trait for anything that persists a finished crawl
///
/// Sinks are independent of each other; a failing sink does not prevent
/// the others from writing.
pub trait OutputSink {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Writes the result and its run report
    ///
    /// # Arguments
    ///
    /// * `result` - The merged crawl result
    /// * `report` - Metadata about the run
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Successfully written
    /// * `Err(OutputError)` - Failed to write
    fn write(&self, result: &CrawlResult, report: &RunReport) -> OutputResult<()>;
}
