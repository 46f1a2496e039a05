//! Confidence scoring
//!
//! All strategies share one scoring function so that their candidates are
//! comparable. A name matching a noise pattern or one of the intent's
//! exclude patterns scores exactly 0 regardless of any bonus; otherwise the
//! strategy's base score is raised by weighted evidence and clamped to [0, 1].

use crate::config::ExtractionConfig;
use crate::extract::clamp_unit;
use crate::intent::{
    QueryIntent, FACTOR_CAPITALIZATION, FACTOR_CONTEXT, FACTOR_DOMAIN, FACTOR_DOMAIN_FOCUS,
    FACTOR_GEOGRAPHIC, FACTOR_INCLUDE, FACTOR_KEYWORD,
};
use crate::url::extract_domain;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Country-code TLD for each place the analyzer recognizes
const PLACE_TLDS: &[(&str, &str)] = &[
    ("usa", ".us"),
    ("uk", ".uk"),
    ("canada", ".ca"),
    ("australia", ".au"),
    ("germany", ".de"),
    ("france", ".fr"),
    ("netherlands", ".nl"),
    ("spain", ".es"),
    ("italy", ".it"),
    ("japan", ".jp"),
    ("china", ".cn"),
    ("india", ".in"),
    ("nigeria", ".ng"),
    ("kenya", ".ke"),
    ("south africa", ".za"),
    ("brazil", ".br"),
];

/// What a strategy knows about one candidate
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    /// Candidate name
    pub name: &'a str,

    /// The organization's website, if known
    pub url: Option<&'a Url>,

    /// Text surrounding the name on the page
    pub context: Option<&'a str>,

    /// Strategy base score
    pub base: f64,
}

/// Scores candidate names against a query intent
pub struct ConfidenceScorer {
    noise: Vec<Regex>,
    institution_keywords: Vec<String>,
    context_keywords: Vec<String>,
}

impl ConfidenceScorer {
    /// Compiles the noise patterns from `[extraction]`
    pub fn new(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let noise = config
            .noise_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", p, e))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            noise,
            institution_keywords: lowercase(&config.institution_keywords),
            context_keywords: lowercase(&config.context_keywords),
        })
    }

    /// Returns true if the name can never be an organization for this intent
    pub fn is_vetoed(&self, name: &str, intent: &QueryIntent) -> bool {
        looks_like_prose(name)
            || self.noise.iter().any(|re| re.is_match(name))
            || intent.excludes(name)
    }

    /// Returns true if the name contains an institution noun
    pub fn has_institution_keyword(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.institution_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Scores one candidate
    ///
    /// # Scoring
    ///
    /// | Evidence | Weight (intent factor) |
    /// |----------|------------------------|
    /// | Institution noun in name | `keyword` |
    /// | Academic host (`.edu`, `.ac.`, ...) | `domain` |
    /// | Two or more capitalized words | `capitalization` |
    /// | Academic words in the context | `context` |
    /// | Query subject in name or context | `domain_focus` |
    /// | Query place in name, context or TLD | `geographic` |
    /// | Name matches an include pattern | `include_pattern` |
    ///
    /// # Returns
    ///
    /// A value in [0, 1]; exactly 0 for vetoed names
    pub fn score(&self, evidence: &Evidence<'_>, intent: &QueryIntent) -> f64 {
        let name = evidence.name.trim();
        if name.is_empty() || self.is_vetoed(name, intent) {
            return 0.0;
        }

        let name_lower = name.to_lowercase();
        let context_lower = evidence.context.map(str::to_lowercase).unwrap_or_default();
        let host = evidence.url.and_then(extract_domain).unwrap_or_default();

        let mut score = evidence.base;

        if self.has_institution_keyword(name) {
            score += intent.factor(FACTOR_KEYWORD);
        }

        if !host.is_empty() && is_academic_host(&host) {
            score += intent.factor(FACTOR_DOMAIN);
        }

        if capitalized_words(name) >= 2 {
            score += intent.factor(FACTOR_CAPITALIZATION);
        }

        if self
            .context_keywords
            .iter()
            .any(|k| context_lower.contains(k.as_str()))
        {
            score += intent.factor(FACTOR_CONTEXT);
        }

        if intent
            .domain_focus
            .iter()
            .any(|s| name_lower.contains(s.as_str()) || context_lower.contains(s.as_str()))
        {
            score += intent.factor(FACTOR_DOMAIN_FOCUS);
        }

        if intent.geographic_focus.iter().any(|place| {
            name_lower.contains(place.as_str())
                || context_lower.contains(place.as_str())
                || place_tld(place).is_some_and(|tld| host.ends_with(tld))
        }) {
            score += intent.factor(FACTOR_GEOGRAPHIC);
        }

        if intent.includes(name) {
            score += intent.factor(FACTOR_INCLUDE);
        }

        clamp_unit(score)
    }
}

/// Returns true for hosts that look like an academic institution's
///
/// # Examples
///
/// ```
/// use campus_scout::extract::is_academic_host;
///
/// assert!(is_academic_host("www.example.edu"));
/// assert!(is_academic_host("ox.ac.uk"));
/// assert!(!is_academic_host("example.com"));
/// ```
pub fn is_academic_host(host: &str) -> bool {
    let host = host.to_lowercase();
    host.ends_with(".edu")
        || host.contains(".edu.")
        || host.contains(".ac.")
        || host.ends_with(".ac")
        || host
            .split('.')
            .any(|label| label.starts_with("uni-") || label.contains("university"))
}

fn place_tld(place: &str) -> Option<&'static str> {
    PLACE_TLDS
        .iter()
        .find(|(name, _)| *name == place)
        .map(|(_, tld)| *tld)
}

fn capitalized_words(name: &str) -> usize {
    name.split_whitespace()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count()
}

/// Sentences and descriptions are not names
fn looks_like_prose(name: &str) -> bool {
    name.chars().count() > 100 || name.matches(',').count() > 2 || name.contains(": ")
}

fn lowercase(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}
