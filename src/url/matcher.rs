/// Checks if a domain matches a wildcard pattern
///
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches "example.com" itself and any
///    subdomain such as "m.example.com" or "a.b.example.com"
///
/// # Examples
///
/// ```
/// use campus_scout::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.facebook.com", "facebook.com"));
/// assert!(matches_wildcard("*.facebook.com", "m.facebook.com"));
/// assert!(!matches_wildcard("*.facebook.com", "notfacebook.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// Returns true if the host matches any of the patterns
pub fn matches_any<S: AsRef<str>>(patterns: &[S], host: &str) -> bool {
    patterns.iter().any(|p| matches_wildcard(p.as_ref(), host))
}
