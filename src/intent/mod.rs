//! Query intent boundary
//!
//! The crawler never interprets the user's query itself. A `QueryAnalyzer`
//! turns it into a `QueryIntent` once per session, and the same analyzer
//! recognizes organization names in page text for the free-text strategy.
//! `KeywordAnalyzer` is the rule-based implementation used by default.

mod keyword;

pub use keyword::{location_terms, KeywordAnalyzer};
pub(crate) use keyword::contains_word;

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Bonus for an institution noun in the candidate name
pub const FACTOR_KEYWORD: &str = "keyword";
/// Bonus for an academic host (`.edu`, `.ac.`, ...)
pub const FACTOR_DOMAIN: &str = "domain";
/// Bonus for two or more capitalized tokens
pub const FACTOR_CAPITALIZATION: &str = "capitalization";
/// Bonus for academic words around a link
pub const FACTOR_CONTEXT: &str = "context";
/// Bonus for a subject from the query
pub const FACTOR_DOMAIN_FOCUS: &str = "domain_focus";
/// Bonus for a place from the query
pub const FACTOR_GEOGRAPHIC: &str = "geographic";
/// Bonus for a name matching an include pattern
pub const FACTOR_INCLUDE: &str = "include_pattern";

/// Weight used when an intent does not carry a factor
pub fn default_factor(name: &str) -> f64 {
    match name {
        FACTOR_KEYWORD => 0.3,
        FACTOR_DOMAIN => 0.3,
        FACTOR_CAPITALIZATION => 0.2,
        FACTOR_CONTEXT => 0.1,
        FACTOR_DOMAIN_FOCUS => 0.1,
        FACTOR_GEOGRAPHIC => 0.1,
        FACTOR_INCLUDE => 0.15,
        _ => 0.0,
    }
}

/// What the user is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    /// Universities, colleges and similar institutions
    Academic,
    /// Scholarships, grants and their providers
    Funding,
    /// Anything else
    General,
}

impl fmt::Display for SearchIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Academic => "academic",
            Self::Funding => "funding",
            Self::General => "general",
        };
        write!(f, "{}", name)
    }
}

/// Structured reading of a query, immutable for a crawl session
#[derive(Debug, Clone)]
pub struct QueryIntent {
    /// The query text as given
    pub query: String,

    /// Subjects mentioned in the query, lowercase
    pub domain_focus: Vec<String>,

    /// Countries or regions mentioned in the query, lowercase
    pub geographic_focus: Vec<String>,

    /// Overall intent
    pub search_intent: SearchIntent,

    /// Weight per scoring factor; missing factors use [`default_factor`]
    pub confidence_factors: HashMap<String, f64>,

    /// Names matching any of these earn the include bonus
    pub include_patterns: Vec<Regex>,

    /// Names matching any of these score exactly 0
    pub exclude_patterns: Vec<Regex>,
}

impl QueryIntent {
    /// An academic intent with no focus and default weights
    pub fn academic(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain_focus: Vec::new(),
            geographic_focus: Vec::new(),
            search_intent: SearchIntent::Academic,
            confidence_factors: HashMap::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Returns the weight for a scoring factor
    pub fn factor(&self, name: &str) -> f64 {
        self.confidence_factors
            .get(name)
            .copied()
            .unwrap_or_else(|| default_factor(name))
    }

    /// Returns true if the name matches any exclude pattern
    pub fn excludes(&self, name: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(name))
    }

    /// Returns true if the name matches any include pattern
    pub fn includes(&self, name: &str) -> bool {
        self.include_patterns.iter().any(|re| re.is_match(name))
    }
}

/// Kind of a recognized entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Organization,
    Location,
    Other,
}

/// A named entity found in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub text: String,
    pub label: EntityLabel,
}

/// External collaborator that interprets text
pub trait QueryAnalyzer: Send + Sync {
    /// Turns a query into an intent; called once per session
    fn analyze(&self, text: &str) -> QueryIntent;

    /// Finds named entities in page text
    fn extract_entities(&self, text: &str) -> Vec<NamedEntity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_defaults_and_overrides() {
        let mut intent = QueryIntent::academic("universities");
        assert_eq!(intent.factor(FACTOR_KEYWORD), 0.3);
        assert_eq!(intent.factor("unknown"), 0.0);

        intent
            .confidence_factors
            .insert(FACTOR_KEYWORD.to_string(), 0.5);
        assert_eq!(intent.factor(FACTOR_KEYWORD), 0.5);
    }

    #[test]
    fn test_exclude_and_include() {
        let mut intent = QueryIntent::academic("universities");
        intent.exclude_patterns.push(Regex::new(r"(?i)\bvisa\b").unwrap());
        intent.include_patterns.push(Regex::new(r"(?i)\buniversity\b").unwrap());

        assert!(intent.excludes("Student Visa Guide"));
        assert!(!intent.excludes("Example University"));
        assert!(intent.includes("Example University"));
    }

    #[test]
    fn test_search_intent_display() {
        assert_eq!(SearchIntent::Academic.to_string(), "academic");
        assert_eq!(SearchIntent::Funding.to_string(), "funding");
    }
}
