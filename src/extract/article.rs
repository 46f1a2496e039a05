//! Article strategy and item-name cleaning
//!
//! Ranking articles and "best universities" posts name institutions in
//! headings, bold text and numbered list items rather than in links or
//! tables. Those texts carry rank prefixes and trailing locations
//! ("1. Example University – Springfield") that are cut before scoring, and
//! article structure ("Frequently asked questions") is rejected outright.
//!
//! The page title is part of each candidate's context, so a title such as
//! "Best Research Universities in Germany" lends its subject and place.

use crate::extract::{
    clean_text, ConfidenceScorer, EntityExtractor, Evidence, ExtractionMethod, OrgType,
    OrganizationCandidate,
};
use crate::intent::QueryIntent;
use crate::url::is_same_site;
use crate::{ConfigError, ExtractionError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Texts that are article titles, not list entries
const ARTICLE_TITLE_PATTERNS: &[&str] = &[
    r"^\d+\s+(cheapest|best|top|affordable|free)\b",
    r"\b(scholarships?|programs?|courses?)\s+(in|for|at)\b",
    r"\bhow to (get|apply|write)\b",
    r"\b(tips|guide|ways|steps) (for|to)\b",
    r"\b(fully|partially) funded\b",
    r"\bwithout (ielts|toefl|gre|gmat)\b",
    r"\binternational students\b",
];

/// Headings and phrases that structure an article
const NOT_A_NAME_PATTERNS: &[&str] = &[
    r"^(what|how|why|when|where|can|is|are|do|does|will|should|which)\b",
    r"^(best|top|cheapest|most|ultimate|complete|list|guide|tips|steps|ways|things)\b",
    r"\b(frequently asked|courses and fees|eligibility criteria|top ranked|list of|requirements)\b",
];

/// "1. ", "3) ", "=8. ", "#5 "
const RANK_PREFIX: &str = r"^(?:=?\d+[.)]|#\d+)\s*";

const TRAILING_DESCRIPTION: &str = r"(?i)\s+taught in english\b.*$";

const SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | ", " ("];

const MIN_NAME_CHARS: usize = 5;
const MAX_NAME_CHARS: usize = 100;

/// Compiled rules for turning item text into an institution name
pub(crate) struct ItemNameRules {
    article_titles: Vec<Regex>,
    not_a_name: Vec<Regex>,
    rank_prefix: Regex,
    trailing: Regex,
}

impl ItemNameRules {
    pub(crate) fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            article_titles: compile_all(ARTICLE_TITLE_PATTERNS)?,
            not_a_name: compile_all(NOT_A_NAME_PATTERNS)?,
            rank_prefix: compile(RANK_PREFIX)?,
            trailing: compile(TRAILING_DESCRIPTION)?,
        })
    }

    /// Strips rank prefixes and trailing details from a list entry
    ///
    /// Returns `None` when the text reads like an article title or nothing
    /// is left after cleaning.
    pub(crate) fn clean(&self, text: &str) -> Option<String> {
        let text = clean_text(text);
        let lower = text.to_lowercase();
        if self.article_titles.iter().any(|re| re.is_match(&lower)) {
            return None;
        }

        let unranked = self.rank_prefix.replace(&text, "");
        let cut = SEPARATORS
            .iter()
            .filter_map(|sep| unranked.find(sep))
            .min()
            .unwrap_or(unranked.len());
        let name = self.trailing.replace(&unranked[..cut], "");
        let name = name.trim();

        (!name.is_empty()).then(|| name.to_string())
    }

    /// Stricter check for names taken from headings and emphasis
    ///
    /// Requires an institution noun and at least two capitalized words of
    /// three or more letters.
    pub(crate) fn looks_like_institution(&self, name: &str, scorer: &ConfidenceScorer) -> bool {
        let chars = name.chars().count();
        if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars) || name.contains('?') {
            return false;
        }

        let lower = name.to_lowercase();
        if self.not_a_name.iter().any(|re| re.is_match(&lower)) {
            return false;
        }

        let capitalized = name
            .split_whitespace()
            .filter(|w| w.chars().count() > 2 && w.chars().next().is_some_and(char::is_uppercase))
            .count();

        scorer.has_institution_keyword(name) && capitalized >= 2
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile(p)).collect()
}

impl EntityExtractor {
    /// Names from headings, bold text and list items of an article page
    pub(super) fn article_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        page_title: Option<&str>,
        errors: &mut Vec<ExtractionError>,
    ) -> Vec<OrganizationCandidate> {
        let (Ok(headings), Ok(emphasis), Ok(items), Ok(nested), Ok(anchors)) = (
            Selector::parse("h1, h2, h3, h4, h5, h6"),
            Selector::parse("strong, b"),
            Selector::parse("li"),
            Selector::parse("ul, ol"),
            Selector::parse("a[href]"),
        ) else {
            return Vec::new();
        };

        let mut found: Vec<OrganizationCandidate> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut keep = |candidate: OrganizationCandidate| {
            let key = candidate.name.to_lowercase();
            match by_name.get(&key) {
                Some(&i) if found[i].confidence() >= candidate.confidence() => {}
                Some(&i) => found[i] = candidate,
                None => {
                    by_name.insert(key, found.len());
                    found.push(candidate);
                }
            }
        };

        for heading in document.select(&headings) {
            let link = heading.select(&anchors).next();
            if let Some(c) = self.article_candidate(&heading, link, source_url, intent, page_title, errors) {
                keep(c);
            }
        }

        for element in document.select(&emphasis) {
            let link = element
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.select(&anchors).next());
            if let Some(c) = self.article_candidate(&element, link, source_url, intent, page_title, errors) {
                keep(c);
            }
        }

        for item in document.select(&items) {
            if item.select(&nested).next().is_some() {
                continue;
            }
            let link = item.select(&anchors).next();
            if let Some(c) = self.article_candidate(&item, link, source_url, intent, page_title, errors) {
                keep(c);
            }
        }

        found
    }

    fn article_candidate(
        &self,
        element: &ElementRef<'_>,
        link: Option<ElementRef<'_>>,
        source_url: &Url,
        intent: &QueryIntent,
        page_title: Option<&str>,
        errors: &mut Vec<ExtractionError>,
    ) -> Option<OrganizationCandidate> {
        let text = clean_text(&element.text().collect::<String>());
        let name = self.item_names.clean(&text)?;
        if !self.item_names.looks_like_institution(&name, &self.scorer) {
            return None;
        }

        let url = match link {
            Some(anchor) => match self.resolve_href(&anchor, source_url) {
                Ok(url) => url.filter(|u| !is_same_site(u, source_url) && !self.is_skipped(u)),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => None,
        };

        let context = match page_title {
            Some(title) => format!("{} {}", text, title),
            None => text,
        };

        let confidence = self.scorer.score(
            &Evidence {
                name: &name,
                url: url.as_ref(),
                context: Some(&context),
                base: 0.0,
            },
            intent,
        );
        if !self.accepts(confidence, self.config.article_min_confidence) {
            return None;
        }

        Some(
            OrganizationCandidate::new(
                name.clone(),
                url.map(String::from),
                OrgType::classify(&name),
                source_url.as_str(),
                confidence,
                ExtractionMethod::ArticleContent,
            )
            .with_description(page_title.map(|t| format!("Found in article: {}", t))),
        )
    }
}
