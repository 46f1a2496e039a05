use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use campus_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.edu:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.edu".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the key used for per-origin politeness: `host` or `host:port`
///
/// Two servers on the same host but different ports are different origins,
/// so they get independent rate limits and robots policies.
pub fn origin_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns the host with any leading `www.` removed
pub fn site_host(url: &Url) -> Option<String> {
    extract_domain(url).map(|h| match h.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => h,
    })
}

/// Returns true if both URLs point at the same site, ignoring `www.` and ports
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (site_host(a), site_host(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_lowercases() {
        let url = Url::parse("https://Example.EDU/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.edu".to_string()));
    }

    #[test]
    fn test_origin_key_without_port() {
        let url = Url::parse("https://example.edu/page").unwrap();
        assert_eq!(origin_key(&url), Some("example.edu".to_string()));
    }

    #[test]
    fn test_origin_key_default_port_is_dropped() {
        let url = Url::parse("https://example.edu:443/page").unwrap();
        assert_eq!(origin_key(&url), Some("example.edu".to_string()));
    }

    #[test]
    fn test_origin_key_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/page").unwrap();
        assert_eq!(origin_key(&url), Some("127.0.0.1:8080".to_string()));
    }

    #[test]
    fn test_site_host_strips_www() {
        let url = Url::parse("https://www.example.edu/").unwrap();
        assert_eq!(site_host(&url), Some("example.edu".to_string()));
    }

    #[test]
    fn test_is_same_site() {
        let a = Url::parse("https://www.example.edu/a").unwrap();
        let b = Url::parse("https://example.edu/b").unwrap();
        let c = Url::parse("https://other.edu/").unwrap();
        assert!(is_same_site(&a, &b));
        assert!(!is_same_site(&a, &c));
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("mailto:admissions@example.edu").unwrap();
        assert_eq!(extract_domain(&url), None);
        assert_eq!(origin_key(&url), None);
    }
}
