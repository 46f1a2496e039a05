//! Markdown summary generation
//!
//! This module generates a human-readable report of a session: run
//! information, an explicit status line, the organization table and the
//! URLs that failed or were blocked.

use crate::crawler::{CrawlResult, CrawlStatus, UrlIssue};
use crate::output::traits::{OutputResult, OutputSink, RunReport};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Most general-content links listed in the report
const MAX_CONTENT_ROWS: usize = 50;

/// Writes the markdown report to a file
pub struct MarkdownSink {
    path: PathBuf,
}

impl MarkdownSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for MarkdownSink {
    fn name(&self) -> &str {
        "markdown"
    }

    fn write(&self, result: &CrawlResult, report: &RunReport) -> OutputResult<()> {
        let markdown = format_markdown_summary(result, report);

        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;

        tracing::info!("wrote summary to {}", self.path.display());
        Ok(())
    }
}

/// Formats a session as markdown
///
/// # Arguments
///
/// * `result` - The merged crawl result
/// * `report` - Metadata about the run
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(result: &CrawlResult, report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# Campus-Scout Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Query**: {}\n", report.query));
    md.push_str(&format!("- **Intent**: {}\n", report.search_intent));
    if !report.domain_focus.is_empty() {
        md.push_str(&format!("- **Subjects**: {}\n", report.domain_focus.join(", ")));
    }
    if !report.geographic_focus.is_empty() {
        md.push_str(&format!("- **Regions**: {}\n", report.geographic_focus.join(", ")));
    }
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Status
    let status = result.status();
    md.push_str("## Status\n\n");
    md.push_str(&format!("**{}**", status.describe()));
    if result.cancelled {
        md.push_str(" (crawl was cancelled before every request was dispatched)");
    }
    md.push_str("\n\n");

    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Search Results**: {}\n", report.search_hits));
    md.push_str(&format!("- **Requests Dispatched**: {}\n", result.requests_dispatched));
    md.push_str(&format!("- **Pages Extracted**: {}\n", result.pages_extracted));
    md.push_str(&format!("- **Failed**: {}\n", result.failed_urls.len()));
    md.push_str(&format!("- **Blocked**: {}\n", result.blocked_urls.len()));
    md.push_str(&format!("- **Candidates Before Merge**: {}\n", result.candidates_found));
    md.push_str(&format!("- **Organizations**: {}\n\n", result.organizations.len()));

    if status == CrawlStatus::Found {
        md.push_str("## Organizations\n\n");
        md.push_str("| # | Name | Type | Confidence | Method | URL |\n");
        md.push_str("|---|------|------|------------|--------|-----|\n");
        for (i, org) in result.organizations.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} | {} |\n",
                i + 1,
                escape_cell(&org.name),
                org.org_type.as_str(),
                org.confidence(),
                org.method,
                org.url.as_deref().unwrap_or("-")
            ));
        }
        md.push('\n');
    }

    if !result.general_content.is_empty() {
        md.push_str("## General Content\n\n");
        md.push_str("| Title | Kind | URL |\n");
        md.push_str("|-------|------|-----|\n");
        for item in result.general_content.iter().take(MAX_CONTENT_ROWS) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&item.title),
                item.kind.as_str(),
                item.url
            ));
        }
        if result.general_content.len() > MAX_CONTENT_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                result.general_content.len() - MAX_CONTENT_ROWS
            ));
        }
        md.push('\n');
    }

    push_issues(&mut md, "Failed URLs", &result.failed_urls);
    push_issues(&mut md, "Blocked URLs", &result.blocked_urls);

    md
}

fn push_issues(md: &mut String, heading: &str, issues: &[UrlIssue]) {
    if issues.is_empty() {
        return;
    }
    md.push_str(&format!("## {}\n\n", heading));
    md.push_str("| URL | Reason |\n");
    md.push_str("|-----|--------|\n");
    for issue in issues {
        md.push_str(&format!("| {} | {} |\n", issue.url, escape_cell(&issue.reason)));
    }
    md.push('\n');
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
