use crate::UrlError;
use url::Url;

/// Query parameters that never change the page being served
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "mc_eid", "mc_cid", "ref", "source", "_ga",
];

/// Normalizes a URL into the key used to avoid queueing the same page twice
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host and remove a `www.` prefix
/// 3. Remove dot segments, duplicate slashes and a trailing slash
/// 4. Remove the fragment
/// 5. Remove tracking parameters and sort the rest
///
/// The scheme is kept as-is; the normalized URL is a key, not the address
/// that gets fetched.
///
/// # Examples
///
/// ```
/// use campus_scout::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.EDU/admissions/?utm_source=x#apply").unwrap();
/// assert_eq!(url.as_str(), "https://example.edu/admissions");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingDomain)?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_kept() {
        let result = normalize_url("http://example.edu/page").unwrap();
        assert_eq!(result.as_str(), "http://example.edu/page");
    }

    #[test]
    fn test_remove_www_and_lowercase() {
        let result = normalize_url("https://WWW.EXAMPLE.EDU/Programs").unwrap();
        assert_eq!(result.as_str(), "https://example.edu/Programs");
    }

    #[test]
    fn test_trailing_slash_and_root() {
        assert_eq!(
            normalize_url("https://example.edu/page/").unwrap().as_str(),
            "https://example.edu/page"
        );
        assert_eq!(
            normalize_url("https://example.edu").unwrap().as_str(),
            "https://example.edu/"
        );
    }

    #[test]
    fn test_dot_segments_and_slashes() {
        let result = normalize_url("https://example.edu//a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.edu/b/c");
    }

    #[test]
    fn test_tracking_params_removed_and_sorted() {
        let result =
            normalize_url("https://example.edu/list?b=2&utm_medium=email&a=1&fbclid=9").unwrap();
        assert_eq!(result.as_str(), "https://example.edu/list?a=1&b=2");
    }

    #[test]
    fn test_fragment_removed() {
        let result = normalize_url("https://example.edu/page#top").unwrap();
        assert_eq!(result.as_str(), "https://example.edu/page");
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            normalize_url("ftp://example.edu/file"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }
}
