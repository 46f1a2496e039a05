//! SQLite results database
//!
//! Every run appends one row to `runs`; its organizations, general content
//! and URL issues reference that row, so a single database file can hold
//! the history of many sessions.

use crate::crawler::{CrawlResult, UrlIssue};
use crate::output::traits::{OutputResult, OutputSink, RunReport};
use rusqlite::{params, Connection, Transaction};
use std::path::PathBuf;

/// SQL schema for the results database
pub const SCHEMA_SQL: &str = r#"
-- One row per session
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    search_intent TEXT NOT NULL,
    config_hash TEXT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    search_hits INTEGER NOT NULL,
    pages_extracted INTEGER NOT NULL,
    candidates_found INTEGER NOT NULL,
    cancelled INTEGER NOT NULL
);

-- Merged organizations
CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    name TEXT NOT NULL,
    url TEXT,
    org_type TEXT NOT NULL,
    source_url TEXT NOT NULL,
    confidence REAL NOT NULL,
    method TEXT NOT NULL,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_organizations_run ON organizations(run_id);

-- Links that were not organizations
CREATE TABLE IF NOT EXISTS general_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    kind TEXT NOT NULL,
    source_url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS failed_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    reason TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blocked_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    reason TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Appends each run to a SQLite database file
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> OutputResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(conn)
    }
}

impl OutputSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn write(&self, result: &CrawlResult, report: &RunReport) -> OutputResult<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let run_id = insert_run(&tx, result, report)?;
        insert_rows(&tx, run_id, result)?;
        tx.commit()?;

        tracing::info!(
            "recorded run {} ({} organizations) in {}",
            run_id,
            result.organizations.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn insert_run(tx: &Transaction<'_>, result: &CrawlResult, report: &RunReport) -> OutputResult<i64> {
    tx.execute(
        "INSERT INTO runs (query, search_intent, config_hash, started_at, finished_at, status,
                           search_hits, pages_extracted, candidates_found, cancelled)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            report.query,
            report.search_intent,
            report.config_hash,
            report.started_at.to_rfc3339(),
            report.finished_at.map(|t| t.to_rfc3339()),
            format!("{:?}", result.status()),
            report.search_hits as i64,
            result.pages_extracted as i64,
            result.candidates_found as i64,
            result.cancelled,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_rows(tx: &Transaction<'_>, run_id: i64, result: &CrawlResult) -> OutputResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO organizations (run_id, name, url, org_type, source_url, confidence, method, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for org in &result.organizations {
        stmt.execute(params![
            run_id,
            org.name,
            org.url,
            org.org_type.as_str(),
            org.source_url,
            org.confidence(),
            org.method.as_str(),
            org.description,
        ])?;
    }

    let mut stmt = tx.prepare(
        "INSERT INTO general_content (run_id, title, url, kind, source_url) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for item in &result.general_content {
        stmt.execute(params![run_id, item.title, item.url, item.kind.as_str(), item.source_url])?;
    }

    insert_issues(tx, "failed_urls", run_id, &result.failed_urls)?;
    insert_issues(tx, "blocked_urls", run_id, &result.blocked_urls)?;
    Ok(())
}

fn insert_issues(tx: &Transaction<'_>, table: &str, run_id: i64, issues: &[UrlIssue]) -> OutputResult<()> {
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {} (run_id, url, reason) VALUES (?1, ?2, ?3)",
        table
    ))?;
    for issue in issues {
        stmt.execute(params![run_id, issue.url, issue.reason])?;
    }
    Ok(())
}
