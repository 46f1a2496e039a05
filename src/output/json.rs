//! JSON results file

use crate::crawler::{CrawlResult, CrawlStatus, UrlIssue};
use crate::extract::{ContentItem, OrganizationCandidate};
use crate::output::traits::{OutputResult, OutputSink, RunReport};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes one pretty-printed JSON document per run
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    run: &'a RunReport,
    status: CrawlStatus,
    status_message: &'static str,
    pages_extracted: usize,
    candidates_found: usize,
    cancelled: bool,
    organizations: &'a [OrganizationCandidate],
    general_content: &'a [ContentItem],
    failed_urls: &'a [UrlIssue],
    blocked_urls: &'a [UrlIssue],
}

/// Serializes a result and its report
pub fn to_json(result: &CrawlResult, report: &RunReport) -> OutputResult<String> {
    let status = result.status();
    let document = JsonDocument {
        run: report,
        status,
        status_message: status.describe(),
        pages_extracted: result.pages_extracted,
        candidates_found: result.candidates_found,
        cancelled: result.cancelled,
        organizations: &result.organizations,
        general_content: &result.general_content,
        failed_urls: &result.failed_urls,
        blocked_urls: &result.blocked_urls,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

impl OutputSink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, result: &CrawlResult, report: &RunReport) -> OutputResult<()> {
        let json = to_json(result, report)?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        tracing::info!("wrote JSON results to {}", self.path.display());
        Ok(())
    }
}
