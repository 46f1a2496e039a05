//! Output module for persisting crawl results
//!
//! This module handles:
//! - A JSON results document
//! - A SQLite database that accumulates runs
//! - A markdown summary report

mod json;
mod markdown;
mod sqlite;
mod traits;

pub use json::{to_json, JsonSink};
pub use markdown::{format_markdown_summary, MarkdownSink};
pub use sqlite::{initialize_schema, SqliteSink};
pub use traits::{OutputError, OutputResult, OutputSink, RunReport};

use crate::config::OutputConfig;
use crate::crawler::CrawlResult;

/// Builds one sink per configured output path
pub fn configured_sinks(config: &OutputConfig) -> Vec<Box<dyn OutputSink>> {
    let mut sinks: Vec<Box<dyn OutputSink>> = Vec::new();
    if let Some(path) = &config.json_path {
        sinks.push(Box::new(JsonSink::new(path)));
    }
    if let Some(path) = &config.database_path {
        sinks.push(Box::new(SqliteSink::new(path)));
    }
    if let Some(path) = &config.summary_path {
        sinks.push(Box::new(MarkdownSink::new(path)));
    }
    sinks
}

/// Writes to every sink, continuing past failures
///
/// # Returns
///
/// The number of sinks that failed; each failure is logged.
pub fn write_all(sinks: &[Box<dyn OutputSink>], result: &CrawlResult, report: &RunReport) -> usize {
    let mut failures = 0;
    for sink in sinks {
        if let Err(e) = sink.write(result, report) {
            tracing::error!("{} output failed: {}", sink.name(), e);
            failures += 1;
        }
    }
    failures
}
