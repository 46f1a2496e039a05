//! Name normalization and similarity

use std::collections::BTreeSet;

/// Words that carry no identity in an institution name
const STOP_WORDS: &[&str] = &[
    "the", "of", "and", "at", "for", "in", "university", "college", "institute",
];

/// Reduces a name to its identifying words
///
/// Lowercases, replaces punctuation with spaces, drops stop words and
/// collapses whitespace. A name made only of stop words keeps them, so that
/// "The University" does not collapse to an empty key.
///
/// # Examples
///
/// ```
/// use campus_scout::dedup::normalize_name;
///
/// assert_eq!(normalize_name("The University of Example"), "example");
/// assert_eq!(normalize_name("Example  University!"), "example");
/// ```
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let kept: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();

    if kept.is_empty() {
        words.join(" ")
    } else {
        kept.join(" ")
    }
}

/// Jaccard similarity of the word sets of two normalized names
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();

    if left.is_empty() && right.is_empty() {
        return 1.0;
    }

    let shared = left.intersection(&right).count() as f64;
    let total = left.union(&right).count() as f64;
    shared / total
}
