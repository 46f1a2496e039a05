//! Campus-Scout main entry point
//!
//! This is the command-line interface for the Campus-Scout organization finder.

use anyhow::{bail, Context};
use campus_scout::config::{load_config_with_hash, validate, Config};
use campus_scout::crawler::{build_http_client, CrawlOrchestrator};
use campus_scout::intent::{KeywordAnalyzer, QueryAnalyzer};
use campus_scout::output::{configured_sinks, write_all, RunReport};
use campus_scout::search::{seed_max_results, DuckDuckGoProvider, SearchProvider, StaticProvider};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Campus-Scout: polite discovery of academic organizations
///
/// Campus-Scout searches the web for a query, crawls the results while
/// respecting robots.txt and rate limits, and reports a deduplicated,
/// confidence-ranked list of the organizations it found.
#[derive(Parser, Debug)]
#[command(name = "campus-scout")]
#[command(version)]
#[command(about = "Polite discovery of academic organizations", long_about = None)]
struct Cli {
    /// What to look for, e.g. "universities in germany offering physics"
    #[arg(value_name = "QUERY")]
    query: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of search results to crawl
    #[arg(long)]
    max_results: Option<usize>,

    /// Size of the worker pool
    #[arg(long)]
    workers: Option<usize>,

    /// Minimum delay between requests to one domain (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Fetch attempts per URL
    #[arg(long)]
    max_retries: Option<u32>,

    /// File with one URL per line to crawl instead of searching
    #[arg(long, value_name = "FILE")]
    urls: Option<PathBuf>,

    /// Write results as JSON to this path
    #[arg(long, value_name = "FILE")]
    json: Option<String>,

    /// Append results to this SQLite database
    #[arg(long, value_name = "FILE")]
    db: Option<String>,

    /// Write a markdown summary to this path
    #[arg(long, value_name = "FILE")]
    summary: Option<String>,

    /// Do not consult robots.txt
    #[arg(long)]
    no_robots: bool,

    /// Analyze the query and show the effective configuration without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);

    let seeds = match &cli.urls {
        Some(path) => {
            let seeds = StaticProvider::from_seed_file(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if seeds.is_empty() {
                bail!("{} contains no URLs", path.display());
            }
            let max_results = seed_max_results(&seeds, cli.max_results, config.search.max_results);
            if max_results > config.search.max_results {
                tracing::info!("Raising max results to {} to cover every seed URL", max_results);
            }
            config.search.max_results = max_results;
            tracing::info!("Using {} URL(s) from {} instead of searching", seeds.len(), path.display());
            Some(seeds)
        }
        None => None,
    };

    validate(&config).context("invalid configuration")?;
    let config = Arc::new(config);

    let analyzer: Arc<dyn QueryAnalyzer> = Arc::new(KeywordAnalyzer::new());

    if cli.dry_run {
        handle_dry_run(&config, analyzer.as_ref(), &cli.query);
        return Ok(());
    }

    handle_crawl(config, config_hash, analyzer, seeds, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("campus_scout=info,warn"),
            1 => EnvFilter::new("campus_scout=debug,info"),
            2 => EnvFilter::new("campus_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line flags on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(n) = cli.max_results {
        config.search.max_results = n;
    }
    if let Some(n) = cli.workers {
        config.crawler.max_concurrency = n;
    }
    if let Some(ms) = cli.delay_ms {
        config.rate_limit.min_interval_ms = ms;
    }
    if let Some(n) = cli.max_retries {
        config.rate_limit.max_retries = n;
    }
    if cli.no_robots {
        config.crawler.respect_robots = false;
    }
    if cli.json.is_some() {
        config.output.json_path = cli.json.clone();
    }
    if cli.db.is_some() {
        config.output.database_path = cli.db.clone();
    }
    if cli.summary.is_some() {
        config.output.summary_path = cli.summary.clone();
    }
}

/// Handles the --dry-run mode: shows the analyzed query and effective settings
fn handle_dry_run(config: &Config, analyzer: &dyn QueryAnalyzer, query: &str) {
    let intent = analyzer.analyze(query);

    println!("=== Campus-Scout Dry Run ===\n");

    println!("Query: {}", query);
    println!("  Intent: {}", intent.search_intent);
    println!("  Subjects: {:?}", intent.domain_focus);
    println!("  Regions: {:?}", intent.geographic_focus);
    println!("  Include patterns: {}", intent.include_patterns.len());
    println!("  Exclude patterns: {}", intent.exclude_patterns.len());

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.max_concurrency);
    println!("  Max attempts: {}", config.rate_limit.max_retries);
    println!("  Request budget: {}", config.crawler.request_budget);
    println!("  Listing depth: {}", config.crawler.max_depth);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!("  Domain interval: {}ms", config.rate_limit.min_interval_ms);

    println!("\nSearch:");
    println!("  Endpoint: {}", config.search.endpoint);
    println!("  Max results: {}", config.search.max_results);

    println!("\nUser Agent: {}", config.user_agent.identity());

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path.as_deref().unwrap_or("-"));
    println!("  Database: {}", config.output.database_path.as_deref().unwrap_or("-"));
    println!("  Summary: {}", config.output.summary_path.as_deref().unwrap_or("-"));

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Arc<Config>,
    config_hash: Option<String>,
    analyzer: Arc<dyn QueryAnalyzer>,
    seeds: Option<StaticProvider>,
    cli: &Cli,
) -> anyhow::Result<()> {
    let client = build_http_client(&config).context("failed to build HTTP client")?;

    let provider: Box<dyn SearchProvider> = match seeds {
        Some(seeds) => Box::new(seeds),
        None => Box::new(
            DuckDuckGoProvider::new(client.clone(), &config.search)
                .context("invalid search endpoint")?,
        ),
    };

    let orchestrator = CrawlOrchestrator::with_client(config.clone(), client, analyzer)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight requests");
            interrupt.cancel();
        }
    });

    let started_at = Utc::now();
    let session = orchestrator
        .run_session(&cli.query, provider.as_ref(), cancel)
        .await;

    let report = RunReport::new(&session.intent, config_hash)
        .started(started_at)
        .with_search_hits(session.hits.len())
        .finish();

    let result = &session.result;
    tracing::info!("{}", result.status());
    for (i, org) in result.organizations.iter().take(10).enumerate() {
        tracing::info!(
            "{:>2}. {} ({:.2}, {}){}",
            i + 1,
            org.name,
            org.confidence(),
            org.method,
            org.url.as_deref().map(|u| format!(" {}", u)).unwrap_or_default()
        );
    }

    let sinks = configured_sinks(&config.output);
    let failures = write_all(&sinks, result, &report);
    if failures > 0 {
        bail!("{} output(s) could not be written", failures);
    }

    Ok(())
}
