//! Entity extraction
//!
//! Every fetched page goes through four independent strategies:
//! - JSON-LD structured data
//! - Hyperlinks leaving the site
//! - Table rows and list items
//! - Free text handed to the query analyzer's entity recognizer
//!
//! Article pages (listing pages followed during the crawl, or any page whose
//! title reads like a ranking) also get a fifth pass over headings, bold
//! text and list items.
//!
//! Each strategy scores its own candidates with the shared
//! [`ConfidenceScorer`] and drops those under its cutoff. A failure inside one
//! strategy skips the offending block or row and never affects the others.
//! Links that do not name an organization are kept as [`ContentItem`]s.

mod article;
mod confidence;
mod content;
mod free_text;
mod links;
mod structured;
mod tables;

pub use confidence::{is_academic_host, ConfidenceScorer, Evidence};
pub use content::{ContentItem, ContentKind};

use crate::config::{Config, ExtractionConfig};
use article::ItemNameRules;
use crate::intent::{QueryAnalyzer, QueryIntent};
use crate::{ConfigError, ExtractionError};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    StructuredData,
    LinkAnalysis,
    TableExtraction,
    ListExtraction,
    ArticleContent,
    #[serde(rename = "free_text_ner")]
    FreeText,
}

impl ExtractionMethod {
    /// Stable name used in output files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredData => "structured_data",
            Self::LinkAnalysis => "link_analysis",
            Self::TableExtraction => "table_extraction",
            Self::ListExtraction => "list_extraction",
            Self::ArticleContent => "article_content",
            Self::FreeText => "free_text_ner",
        }
    }

    /// Tie-break rank when merging; higher wins
    pub fn rank(&self) -> u8 {
        match self {
            Self::StructuredData => 5,
            Self::TableExtraction => 4,
            Self::ListExtraction => 3,
            Self::ArticleContent => 2,
            Self::LinkAnalysis => 1,
            Self::FreeText => 0,
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse kind of organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    University,
    College,
    Institute,
    School,
    ResearchCenter,
    Organization,
}

impl OrgType {
    /// Guesses the kind from the institution noun in a name
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("universit") || lower.contains("hochschule") {
            Self::University
        } else if lower.contains("college") {
            Self::College
        } else if lower.contains("institut") || lower.contains("polytechnic") {
            Self::Institute
        } else if lower.contains("school") || lower.contains("academy") || lower.contains("école")
        {
            Self::School
        } else if lower.contains("research") || lower.contains("laborator") {
            Self::ResearchCenter
        } else {
            Self::Organization
        }
    }

    /// Maps a schema.org type, if it names a specific kind
    pub fn from_schema_type(schema_type: &str) -> Option<Self> {
        match schema_type {
            "CollegeOrUniversity" => Some(Self::University),
            "School" | "HighSchool" | "MiddleSchool" | "ElementarySchool" => Some(Self::School),
            "ResearchOrganization" => Some(Self::ResearchCenter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::University => "university",
            Self::College => "college",
            Self::Institute => "institute",
            Self::School => "school",
            Self::ResearchCenter => "research_center",
            Self::Organization => "organization",
        }
    }
}

/// An organization found on one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationCandidate {
    /// Display name as found on the page
    pub name: String,

    /// The organization's own website, when known
    pub url: Option<String>,

    /// Kind of organization
    pub org_type: OrgType,

    /// Page the candidate was extracted from
    pub source_url: String,

    confidence: f64,

    /// Strategy that produced the candidate
    pub method: ExtractionMethod,

    /// Free-form description, when the page offered one
    pub description: Option<String>,
}

impl OrganizationCandidate {
    /// Creates a candidate; the confidence is clamped to [0, 1]
    pub fn new(
        name: impl Into<String>,
        url: Option<String>,
        org_type: OrgType,
        source_url: impl Into<String>,
        confidence: f64,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            name: name.into(),
            url,
            org_type,
            source_url: source_url.into(),
            confidence: clamp_unit(confidence),
            method,
            description: None,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    /// Confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Everything extracted from one page
#[derive(Debug, Default)]
pub struct PageExtraction {
    /// Contents of `<title>`
    pub title: Option<String>,

    /// Candidates from all strategies, above their cutoffs
    pub candidates: Vec<OrganizationCandidate>,

    /// Links that did not become candidates
    pub content: Vec<ContentItem>,

    /// Blocks or rows a strategy had to skip
    pub errors: Vec<ExtractionError>,
}

/// Runs every extraction strategy over fetched pages
pub struct EntityExtractor {
    config: ExtractionConfig,
    skip_domains: Vec<String>,
    scorer: ConfidenceScorer,
    listing_patterns: Vec<Regex>,
    onclick_target: Regex,
    item_names: ItemNameRules,
    analyzer: Arc<dyn QueryAnalyzer>,
}

impl EntityExtractor {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `config` - Full configuration; thresholds and pattern tables come
    ///   from `[extraction]`, the skip list from `[crawler]`
    /// * `analyzer` - Entity recognizer for the free-text strategy
    ///
    /// # Returns
    ///
    /// * `Ok(EntityExtractor)` - Ready to use
    /// * `Err(ConfigError::InvalidPattern)` - A configured regex does not compile
    pub fn new(config: &Config, analyzer: Arc<dyn QueryAnalyzer>) -> Result<Self, ConfigError> {
        let listing_patterns = config
            .extraction
            .listing_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", p, e))))
            .collect::<Result<Vec<_>, _>>()?;

        let onclick_target = Regex::new(r#"['"]((?:https?:)?//[^'"\s]+|/[^'"\s]*)['"]"#)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            config: config.extraction.clone(),
            skip_domains: config.crawler.skip_domains.clone(),
            scorer: ConfidenceScorer::new(&config.extraction)?,
            listing_patterns,
            onclick_target,
            item_names: ItemNameRules::new()?,
            analyzer,
        })
    }

    /// The analyzer used for free text and query analysis
    pub fn analyzer(&self) -> &Arc<dyn QueryAnalyzer> {
        &self.analyzer
    }

    /// The scorer shared by all strategies
    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    /// Returns the organization candidates found on a page
    pub fn extract(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
    ) -> Vec<OrganizationCandidate> {
        self.extract_page(document, source_url, intent).candidates
    }

    /// Runs every strategy and collects candidates, content links and the title
    ///
    /// The article pass runs only when the page title reads like a listing.
    pub fn extract_page(&self, document: &Html, source_url: &Url, intent: &QueryIntent) -> PageExtraction {
        self.extract_with(document, source_url, intent, false)
    }

    /// Like [`extract_page`](Self::extract_page), always including the article pass
    ///
    /// Used for listing pages followed during the crawl.
    pub fn extract_article(&self, document: &Html, source_url: &Url, intent: &QueryIntent) -> PageExtraction {
        self.extract_with(document, source_url, intent, true)
    }

    fn extract_with(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        article: bool,
    ) -> PageExtraction {
        let mut errors = Vec::new();
        let mut candidates = Vec::new();
        let title = page_title(document);

        candidates.extend(self.structured_candidates(document, source_url, intent, &mut errors));
        candidates.extend(self.link_candidates(document, source_url, intent, &mut errors));
        candidates.extend(self.table_candidates(document, source_url, intent, &mut errors));
        candidates.extend(self.list_candidates(document, source_url, intent, &mut errors));
        candidates.extend(self.free_text_candidates(document, source_url, intent));

        let listing_title = title
            .as_deref()
            .is_some_and(|t| self.listing_patterns.iter().any(|re| re.is_match(t)));
        if article || listing_title {
            candidates.extend(self.article_candidates(
                document,
                source_url,
                intent,
                title.as_deref(),
                &mut errors,
            ));
        }

        let claimed: HashSet<String> = candidates.iter().filter_map(|c| c.url.clone()).collect();
        let content = self.content_items(document, source_url, &claimed);

        for error in &errors {
            tracing::debug!("skipped part of {}: {}", source_url, error);
        }

        tracing::debug!(
            "{}: {} candidate(s), {} content link(s)",
            source_url,
            candidates.len(),
            content.len()
        );

        PageExtraction {
            title,
            candidates,
            content,
            errors,
        }
    }

    /// Returns true if a score clears a strategy's cutoff
    fn accepts(&self, confidence: f64, cutoff: f64) -> bool {
        confidence > 0.0 && confidence >= cutoff
    }
}

/// Extracts the page title from the HTML document
pub fn page_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Collapses runs of whitespace into single spaces
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts a string to at most `max` characters
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::KeywordAnalyzer;

    pub(crate) fn create_extractor() -> EntityExtractor {
        EntityExtractor::new(&Config::default(), Arc::new(KeywordAnalyzer::new())).unwrap()
    }

    #[test]
    fn test_candidate_confidence_is_clamped() {
        let high = OrganizationCandidate::new(
            "A University",
            None,
            OrgType::University,
            "https://s.org/",
            1.7,
            ExtractionMethod::LinkAnalysis,
        );
        let nan = OrganizationCandidate::new(
            "B University",
            None,
            OrgType::University,
            "https://s.org/",
            f64::NAN,
            ExtractionMethod::LinkAnalysis,
        );
        assert_eq!(high.confidence(), 1.0);
        assert_eq!(nan.confidence(), 0.0);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ExtractionMethod::StructuredData.as_str(), "structured_data");
        assert_eq!(ExtractionMethod::FreeText.as_str(), "free_text_ner");
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::FreeText).unwrap(),
            "\"free_text_ner\""
        );
        assert_eq!(ExtractionMethod::ArticleContent.as_str(), "article_content");
        assert!(ExtractionMethod::StructuredData.rank() > ExtractionMethod::LinkAnalysis.rank());
        assert!(ExtractionMethod::ListExtraction.rank() > ExtractionMethod::ArticleContent.rank());
        assert!(ExtractionMethod::ArticleContent.rank() > ExtractionMethod::LinkAnalysis.rank());
    }

    #[test]
    fn test_org_type_classification() {
        assert_eq!(OrgType::classify("Universität Wien"), OrgType::University);
        assert_eq!(OrgType::classify("Example State College"), OrgType::College);
        assert_eq!(OrgType::classify("Karolinska Institutet"), OrgType::Institute);
        assert_eq!(OrgType::classify("Juilliard School"), OrgType::School);
        assert_eq!(OrgType::classify("Acme Corp"), OrgType::Organization);
        assert_eq!(
            OrgType::from_schema_type("CollegeOrUniversity"),
            Some(OrgType::University)
        );
    }

    #[test]
    fn test_invalid_listing_pattern_is_rejected() {
        let mut config = Config::default();
        config.extraction.listing_patterns = vec!["(".to_string()];
        let result = EntityExtractor::new(&config, Arc::new(KeywordAnalyzer::new()));
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_page_title() {
        let doc = Html::parse_document("<title>  Study   in Europe </title>");
        assert_eq!(page_title(&doc), Some("Study in Europe".to_string()));
        assert_eq!(page_title(&Html::parse_document("<p>x</p>")), None);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("Universität", 8), "Universi");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_structured_data_wins_over_noisy_anchor() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@type": "CollegeOrUniversity",
             "name": "Example University", "url": "https://www.example.edu/"}
            </script>
            </head><body>
            <a href="https://www.example.edu/apply">Example University (apply now)</a>
            </body></html>
        "#;
        let extractor = create_extractor();
        let source = Url::parse("https://guide.example.org/study").unwrap();
        let intent = extractor.analyzer().analyze("universities in Europe");

        let candidates = extractor.extract(&Html::parse_document(html), &source, &intent);

        assert!(candidates.iter().all(|c| c.name == "Example University"));
        let structured = candidates
            .iter()
            .find(|c| c.method == ExtractionMethod::StructuredData)
            .unwrap();
        assert!(structured.confidence() >= 0.9);
        assert_eq!(structured.url.as_deref(), Some("https://www.example.edu/"));
        assert_eq!(structured.org_type, OrgType::University);
    }

    #[test]
    fn test_article_pass_runs_on_ranking_titles_only() {
        let html = |title: &str| {
            format!(
                "<html><head><title>{}</title></head><body><h2>1. Harvard University – Cambridge, MA</h2></body></html>",
                title
            )
        };
        let extractor = create_extractor();
        let source = Url::parse("https://blog.example.org/post").unwrap();
        let intent = extractor.analyzer().analyze("research universities in the united states");

        let ranking = Html::parse_document(&html("Best Research Universities in the USA"));
        let page = extractor.extract_page(&ranking, &source, &intent);
        assert!(page
            .candidates
            .iter()
            .any(|c| c.name == "Harvard University" && c.method == ExtractionMethod::ArticleContent));

        let plain = Html::parse_document(&html("Campus news"));
        let page = extractor.extract_page(&plain, &source, &intent);
        assert!(page.candidates.iter().all(|c| c.method != ExtractionMethod::ArticleContent));

        let followed = extractor.extract_article(&plain, &source, &intent);
        assert!(followed
            .candidates
            .iter()
            .any(|c| c.name == "Harvard University" && c.method == ExtractionMethod::ArticleContent));
    }

    #[test]
    fn test_listing_link_becomes_content_not_candidate() {
        let html = r#"<body><ul>
            <li><a href="https://rankings.example.com/top-10">Top 10 Universities in Europe</a></li>
        </ul></body>"#;
        let extractor = create_extractor();
        let source = Url::parse("https://guide.example.org/").unwrap();
        let intent = extractor.analyzer().analyze("universities in Europe");

        let page = extractor.extract_page(&Html::parse_document(html), &source, &intent);

        assert!(page.candidates.is_empty());
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].kind, ContentKind::Listing);
    }
}
