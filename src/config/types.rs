use serde::Deserialize;

/// Main configuration structure for Campus-Scout
///
/// Built once at startup and shared read-only (behind an `Arc`) by the
/// rate limiter, the extractor and the deduplication engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub search: SearchConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Size of the worker pool
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Hard timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Total number of requests a session may dispatch, secondary pass included
    #[serde(rename = "request-budget")]
    pub request_budget: usize,

    /// How many listing hops the secondary pass may follow
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Whether robots.txt is consulted before fetching
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Optional wall-clock limit for the crawl phase (seconds)
    #[serde(rename = "deadline-secs")]
    pub deadline_secs: Option<u64>,

    /// Host patterns ("example.com" or "*.example.com") that are never fetched
    /// and never reported as organizations
    #[serde(rename = "skip-domains")]
    pub skip_domains: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            request_budget: 100,
            max_depth: 1,
            respect_robots: true,
            deadline_secs: None,
            skip_domains: [
                "*.facebook.com",
                "*.twitter.com",
                "*.x.com",
                "*.linkedin.com",
                "*.instagram.com",
                "*.youtube.com",
                "*.tiktok.com",
                "*.pinterest.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Additional User-Agent strings to rotate through
    pub rotation: Vec<String>,
}

impl UserAgentConfig {
    /// Formats the identity string: `Name/Version (+ContactURL)`
    pub fn identity(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "CampusScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/campus-scout".to_string(),
            rotation: Vec::new(),
        }
    }
}

/// Politeness timing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "min-interval-ms")]
    pub min_interval_ms: u64,

    /// Minimum time between calls to the search provider (milliseconds)
    #[serde(rename = "search-interval-ms")]
    pub search_interval_ms: u64,

    /// First retry delay (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied per retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Ceiling for a single retry delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// GET attempts per URL; consulted by `RateLimiter::should_retry`
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            search_interval_ms: 3000,
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 60_000,
            max_retries: 3,
        }
    }
}

/// Search step configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of hits requested from the provider
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Attempts before the search step gives up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// First retry delay (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied per retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Ceiling for a single retry delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// HTML search endpoint
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 20,
            max_retries: 5,
            initial_delay_ms: 2000,
            backoff_factor: 2.0,
            max_delay_ms: 60_000,
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
        }
    }
}

/// Extraction thresholds and pattern tables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum confidence for JSON-LD candidates
    #[serde(rename = "structured-min-confidence")]
    pub structured_min_confidence: f64,

    /// Minimum confidence for hyperlink candidates
    #[serde(rename = "link-min-confidence")]
    pub link_min_confidence: f64,

    /// Minimum confidence for table and list candidates
    #[serde(rename = "table-min-confidence")]
    pub table_min_confidence: f64,

    /// Minimum confidence for free-text candidates
    #[serde(rename = "free-text-min-confidence")]
    pub free_text_min_confidence: f64,

    /// Minimum confidence for headings and emphasis on article pages
    #[serde(rename = "article-min-confidence")]
    pub article_min_confidence: f64,

    /// Starting score for JSON-LD candidates
    #[serde(rename = "structured-base")]
    pub structured_base: f64,

    /// Starting score for free-text candidates
    #[serde(rename = "free-text-base")]
    pub free_text_base: f64,

    /// Institution nouns, lowercase, in several languages
    #[serde(rename = "institution-keywords")]
    pub institution_keywords: Vec<String>,

    /// Words that mark academic surroundings of a link
    #[serde(rename = "context-keywords")]
    pub context_keywords: Vec<String>,

    /// JSON-LD `@type` values accepted as organizations
    #[serde(rename = "accepted-types")]
    pub accepted_types: Vec<String>,

    /// Regexes that veto a candidate name outright
    #[serde(rename = "noise-patterns")]
    pub noise_patterns: Vec<String>,

    /// Regexes that mark a link title as a listing or directory page
    #[serde(rename = "listing-patterns")]
    pub listing_patterns: Vec<String>,

    /// Longest ancestor text used as link context
    #[serde(rename = "context-max-chars")]
    pub context_max_chars: usize,

    /// Longest visible text handed to entity recognition
    #[serde(rename = "max-text-chars")]
    pub max_text_chars: usize,

    /// Token Jaccard similarity above which same-host names merge
    #[serde(rename = "similarity-threshold")]
    pub similarity_threshold: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            structured_min_confidence: 0.5,
            link_min_confidence: 0.6,
            table_min_confidence: 0.7,
            free_text_min_confidence: 0.5,
            article_min_confidence: 0.7,
            structured_base: 0.9,
            free_text_base: 0.3,
            institution_keywords: strings(&[
                "university",
                "college",
                "institute",
                "academy",
                "polytechnic",
                "school",
                "conservatory",
                "université",
                "universidad",
                "università",
                "universität",
                "universiteit",
                "universidade",
                "hochschule",
                "école",
            ]),
            context_keywords: strings(&[
                "research",
                "faculty",
                "campus",
                "students",
                "academic",
                "degree",
                "admissions",
                "accredited",
                "higher education",
            ]),
            accepted_types: strings(&[
                "CollegeOrUniversity",
                "EducationalOrganization",
                "Organization",
                "School",
                "ResearchOrganization",
            ]),
            noise_patterns: strings(&[
                r"(?i)^\s*(top|best|cheapest|most)\b",
                r"(?i)\btop\s+\d+",
                r"(?i)^\s*(home|about( us)?|contact( us)?|blog|news|privacy( policy)?|terms|cookies|login|sign ?in|sign ?up|menu)\s*$",
                r"(?i)\b(facebook|twitter|linkedin|instagram|youtube|tiktok|pinterest)\b",
                r"(?i)\b(apply now|click here|read more|learn more|see more|register now)\b",
                r"\?\s*$",
            ]),
            listing_patterns: strings(&[
                r"(?i)\b(best|top|cheapest|leading|ranking|rankings)\b.*\b(universities|colleges|schools|institutes)\b",
                r"(?i)\blist\s+of\b.*\b(universities|colleges|schools|institutions)\b",
                r"(?i)\b(universities|colleges|schools)\s+(in|of)\s+[A-Z]",
                r"(?i)\b(directory|all institutions|member institutions|partner universities)\b",
            ]),
            context_max_chars: 500,
            max_text_chars: 20_000,
            similarity_threshold: 0.85,
        }
    }
}

/// Output configuration; an absent path disables that sink
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,

    /// Path to the JSON results file
    #[serde(rename = "json-path")]
    pub json_path: Option<String>,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}
