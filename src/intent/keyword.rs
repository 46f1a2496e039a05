//! Rule-based query analyzer
//!
//! Keyword tables decide the search intent and the geographic and subject
//! focus of a query; capitalized phrases ending in an institution noun are
//! reported as organizations.

use crate::intent::{
    EntityLabel, NamedEntity, QueryAnalyzer, QueryIntent, SearchIntent, FACTOR_CAPITALIZATION,
    FACTOR_CONTEXT, FACTOR_DOMAIN, FACTOR_DOMAIN_FOCUS, FACTOR_GEOGRAPHIC, FACTOR_INCLUDE,
    FACTOR_KEYWORD,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const FUNDING_TERMS: &[&str] = &[
    "scholarship",
    "grant",
    "fellowship",
    "funding",
    "financial aid",
    "bursary",
    "stipend",
];

const ACADEMIC_TERMS: &[&str] = &[
    "university",
    "universities",
    "college",
    "institute",
    "school",
    "study",
    "degree",
    "bachelor",
    "master",
    "phd",
    "campus",
    "academic",
    "education",
    "polytechnic",
];

const SUBJECTS: &[&str] = &[
    "computer science",
    "engineering",
    "medicine",
    "law",
    "business",
    "economics",
    "psychology",
    "biology",
    "chemistry",
    "physics",
    "mathematics",
    "data science",
    "artificial intelligence",
    "architecture",
    "nursing",
    "agriculture",
    "public health",
    "music",
    "arts",
];

const LOCATIONS: &[(&str, &[&str])] = &[
    ("usa", &["united states", "usa", "america", "american"]),
    ("uk", &["united kingdom", "uk", "britain", "england", "scotland", "wales"]),
    ("canada", &["canada", "canadian"]),
    ("australia", &["australia", "australian"]),
    ("germany", &["germany", "german", "deutschland"]),
    ("france", &["france", "french"]),
    ("netherlands", &["netherlands", "dutch", "holland"]),
    ("spain", &["spain", "spanish"]),
    ("italy", &["italy", "italian"]),
    ("japan", &["japan", "japanese"]),
    ("china", &["china", "chinese"]),
    ("india", &["india", "indian"]),
    ("nigeria", &["nigeria", "nigerian"]),
    ("kenya", &["kenya", "kenyan"]),
    ("south africa", &["south africa"]),
    ("brazil", &["brazil", "brazilian"]),
    ("europe", &["europe", "european"]),
    ("asia", &["asia", "asian"]),
    ("africa", &["africa", "african"]),
    ("latin america", &["latin america"]),
];

const ORGANIZATION_PATTERNS: &[&str] = &[
    r"\b(?:\p{Lu}[\w'&.-]*\s+){0,4}(?:University|College|Institute|Polytechnic|Academy|Conservatory)(?:\s+(?:of|for)(?:\s+(?:the\s+)?\p{Lu}[\w'&.-]*){1,4})?",
    r"\b(?:Université|Universidad|Università|Universität|Universidade|Universiteit|Hochschule)(?:\s+(?:de|di|der|do|van|of|del|della)?\s*\p{Lu}[\w'-]*){1,4}",
    r"\bSchool\s+of\s+\p{Lu}[\w'-]*(?:\s+(?:and\s+)?\p{Lu}[\w'-]*){0,3}",
];

const INSTITUTION_INCLUDE: &str =
    r"(?i)\b(universit(y|ies|é|ät|à|ad|ade|eit)|college|institute|polytechnic|academy|hochschule)\b";

const FUNDING_INCLUDE: &str = r"(?i)\b(foundation|trust|fund|council|scholarship)\b";

const ACADEMIC_EXCLUDE: &str =
    r"(?i)\b(admissions?|applications?|visas?|eligibility|fees|tuition|deadlines?|requirements)\b";

/// Keyword-table implementation of [`QueryAnalyzer`]
pub struct KeywordAnalyzer {
    organization_patterns: Vec<Regex>,
}

impl KeywordAnalyzer {
    /// Creates an analyzer with the built-in tables
    pub fn new() -> Self {
        Self {
            organization_patterns: compile(ORGANIZATION_PATTERNS),
        }
    }

    fn detect_intent(lower: &str) -> SearchIntent {
        if FUNDING_TERMS.iter().any(|t| lower.contains(t)) {
            SearchIntent::Funding
        } else if ACADEMIC_TERMS.iter().any(|t| contains_word(lower, t)) {
            SearchIntent::Academic
        } else {
            SearchIntent::General
        }
    }

    fn detect_locations(lower: &str) -> Vec<String> {
        LOCATIONS
            .iter()
            .filter(|(_, aliases)| aliases.iter().any(|a| contains_word(lower, a)))
            .map(|(canonical, _)| canonical.to_string())
            .collect()
    }

    fn factors(intent: SearchIntent) -> HashMap<String, f64> {
        let domain = match intent {
            SearchIntent::Academic | SearchIntent::Funding => 0.3,
            SearchIntent::General => 0.15,
        };

        [
            (FACTOR_KEYWORD, 0.3),
            (FACTOR_DOMAIN, domain),
            (FACTOR_CAPITALIZATION, 0.2),
            (FACTOR_CONTEXT, 0.1),
            (FACTOR_DOMAIN_FOCUS, 0.1),
            (FACTOR_GEOGRAPHIC, 0.1),
            (FACTOR_INCLUDE, 0.15),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryAnalyzer for KeywordAnalyzer {
    fn analyze(&self, text: &str) -> QueryIntent {
        let lower = text.to_lowercase();
        let search_intent = Self::detect_intent(&lower);

        let (include, exclude): (&[&str], &[&str]) = match search_intent {
            SearchIntent::Academic => (&[INSTITUTION_INCLUDE], &[ACADEMIC_EXCLUDE]),
            SearchIntent::Funding => (&[INSTITUTION_INCLUDE, FUNDING_INCLUDE], &[]),
            SearchIntent::General => (&[], &[]),
        };

        let intent = QueryIntent {
            query: text.to_string(),
            domain_focus: SUBJECTS
                .iter()
                .filter(|s| contains_word(&lower, s))
                .map(|s| s.to_string())
                .collect(),
            geographic_focus: Self::detect_locations(&lower),
            search_intent,
            confidence_factors: Self::factors(search_intent),
            include_patterns: compile(include),
            exclude_patterns: compile(exclude),
        };

        tracing::debug!(
            "query '{}' analyzed as {} (places: {:?}, subjects: {:?})",
            text,
            intent.search_intent,
            intent.geographic_focus,
            intent.domain_focus
        );
        intent
    }

    fn extract_entities(&self, text: &str) -> Vec<NamedEntity> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for re in &self.organization_patterns {
            for m in re.find_iter(text) {
                let name = m.as_str().trim().trim_end_matches(['.', ',']).to_string();
                if name.split_whitespace().count() >= 2 && seen.insert(name.clone()) {
                    entities.push(NamedEntity {
                        text: name,
                        label: EntityLabel::Organization,
                    });
                }
            }
        }

        let lower = text.to_lowercase();
        for place in Self::detect_locations(&lower) {
            if seen.insert(place.clone()) {
                entities.push(NamedEntity {
                    text: place,
                    label: EntityLabel::Location,
                });
            }
        }

        entities
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("skipping pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Words that name a canonical location, or the location itself if unknown
pub fn location_terms(canonical: &str) -> Vec<&str> {
    LOCATIONS
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, aliases)| aliases.to_vec())
        .unwrap_or_else(|| vec![canonical])
}

/// Whole-word containment for lowercase haystacks
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
