//! Non-organization links
//!
//! Anchors that did not become candidates are kept as general content. Those
//! whose text reads like a ranking, a list or a directory are worth crawling
//! for the organizations they enumerate.

use crate::extract::links::anchor_text;
use crate::extract::EntityExtractor;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Words marking an index rather than a ranking
const DIRECTORY_TERMS: &[&str] = &["directory", "a-z", "a to z", "index of", "member institutions"];

/// Minimum words for a link title to count as an article
const ARTICLE_MIN_WORDS: usize = 4;

/// What a non-organization link leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Ranking or list of institutions
    Listing,
    /// Index of institutions
    Directory,
    /// Site chrome
    Navigation,
    /// Any other titled page
    Article,
}

impl ContentKind {
    /// Returns true if pages of this kind enumerate organizations
    pub fn is_followable(&self) -> bool {
        matches!(self, Self::Listing | Self::Directory)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Directory => "directory",
            Self::Navigation => "navigation",
            Self::Article => "article",
        }
    }
}

/// A link that does not name an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// Link text
    pub title: String,

    /// Absolute target URL
    pub url: String,

    /// Classification of the target
    pub kind: ContentKind,

    /// Page the link was found on
    pub source_url: String,
}

impl EntityExtractor {
    /// Classifies a link title
    pub fn classify_content(&self, title: &str) -> ContentKind {
        let lower = title.to_lowercase();

        if self.listing_patterns.iter().any(|re| re.is_match(title)) {
            if DIRECTORY_TERMS.iter().any(|t| lower.contains(t)) {
                ContentKind::Directory
            } else {
                ContentKind::Listing
            }
        } else if title.split_whitespace().count() >= ARTICLE_MIN_WORDS {
            ContentKind::Article
        } else {
            ContentKind::Navigation
        }
    }

    pub(super) fn content_items(
        &self,
        document: &Html,
        source_url: &Url,
        claimed: &HashSet<String>,
    ) -> Vec<ContentItem> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for anchor in document.select(&selector) {
            let title = anchor_text(&anchor);
            if title.chars().count() < 3 {
                continue;
            }

            let Ok(Some(url)) = self.resolve_href(&anchor, source_url) else {
                continue;
            };
            if url == *source_url || self.is_skipped(&url) {
                continue;
            }

            let target = url.to_string();
            if claimed.contains(&target) || !seen.insert(target.clone()) {
                continue;
            }

            items.push(ContentItem {
                kind: self.classify_content(&title),
                title,
                url: target,
                source_url: source_url.to_string(),
            });
        }

        items
    }
}
