//! Relevance of search hits to the session's intent
//!
//! Hits are scored before the crawl so that the frontier dispatches the
//! most promising pages first. The score only orders the queue; no hit is
//! dropped for scoring low.

use crate::crawler::{LISTING_PRIORITY, SEARCH_PRIORITY};
use crate::extract::is_academic_host;
use crate::intent::{contains_word, location_terms, QueryIntent, SearchIntent};
use crate::search::SearchHit;

const BASE_SCORE: f64 = 0.3;
const INTENT_BOOST: f64 = 0.2;
const SUBJECT_BOOST: f64 = 0.2;
const GEOGRAPHY_BOOST: f64 = 0.15;
const INCLUDE_BOOST: f64 = 0.1;
const HOST_BOOST: f64 = 0.1;

const ACADEMIC_WORDS: &[&str] = &["university", "universities", "college", "institute", "academic", "campus"];
const FUNDING_WORDS: &[&str] = &["scholarship", "grant", "funding", "financial"];

/// Scores how well a hit matches the intent, in `[0.3, 1.0]`
///
/// Boosts are given for words of the intent's kind in the URL or title,
/// a subject or place from the query in the title or snippet, a title
/// matching an include pattern, and an academic host.
pub fn relevance(hit: &SearchHit, intent: &QueryIntent) -> f64 {
    let url = hit.url.to_lowercase();
    let title = hit.title.to_lowercase();
    let content = format!("{} {}", title, hit.snippet.to_lowercase());

    let mut score = BASE_SCORE;

    let intent_words = match intent.search_intent {
        SearchIntent::Academic => ACADEMIC_WORDS,
        SearchIntent::Funding => FUNDING_WORDS,
        SearchIntent::General => &[],
    };
    if intent_words.iter().any(|w| url.contains(w) || title.contains(w)) {
        score += INTENT_BOOST;
    }

    if intent.domain_focus.iter().any(|s| contains_word(&content, s)) {
        score += SUBJECT_BOOST;
    }

    let in_region = intent.geographic_focus.iter().any(|place| {
        location_terms(place)
            .iter()
            .any(|term| contains_word(&content, term))
    });
    if in_region {
        score += GEOGRAPHY_BOOST;
    }

    if intent.include_patterns.iter().any(|re| re.is_match(&hit.title)) {
        score += INCLUDE_BOOST;
    }

    let academic_host = ::url::Url::parse(&hit.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|host| is_academic_host(&host));
    if academic_host {
        score += HOST_BOOST;
    }

    score.min(1.0)
}

/// Frontier priority for a hit with the given relevance
///
/// Always below [`LISTING_PRIORITY`], so search hits are dispatched before
/// listing pages found during the crawl.
pub fn hit_priority(score: f64) -> u32 {
    let span = f64::from(LISTING_PRIORITY - SEARCH_PRIORITY - 1);
    let offset = ((1.0 - score.clamp(0.0, 1.0)) * span).round() as u32;
    SEARCH_PRIORITY + offset
}
