//! DuckDuckGo HTML search
//!
//! Queries the no-JavaScript results page and reads result links and
//! snippets out of its markup. Result links point at a redirect endpoint
//! carrying the real target in the `uddg` query parameter.

use crate::config::SearchConfig;
use crate::extract::clean_text;
use crate::search::{SearchHit, SearchProvider};
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use url::Url;

/// Search provider backed by DuckDuckGo's HTML endpoint
pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: Url,
}

impl DuckDuckGoProvider {
    /// Creates a provider for the `[search]` endpoint
    pub fn new(client: Client, config: &SearchConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(self.endpoint.as_str())
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        // 202 is served instead of results when the client is being throttled
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::ACCEPTED {
            return Err(SearchError::RateLimited(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(SearchError::Http(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        parse_results(&body, max_results)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Reads result links and snippets from a results page
pub fn parse_results(body: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
    let document = Html::parse_document(body);
    let (Ok(results), Ok(links), Ok(snippets)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Err(SearchError::Parse("invalid result selectors".to_string()));
    };

    let mut hits = Vec::new();
    for result in document.select(&results) {
        let Some(link) = result.select(&links).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(result_target) else {
            continue;
        };

        let title = clean_text(&link.text().collect::<String>());
        let snippet = result
            .select(&snippets)
            .next()
            .map(|s| clean_text(&s.text().collect::<String>()))
            .unwrap_or_default();

        hits.push(SearchHit { title, url, snippet });
        if hits.len() >= max_results {
            break;
        }
    }

    if hits.is_empty() && body.to_lowercase().contains("anomaly") {
        return Err(SearchError::RateLimited("anomaly challenge page".to_string()));
    }

    Ok(hits)
}

/// Unwraps the redirect link of a result; ads and non-HTTP targets yield `None`
fn result_target(href: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href.trim()).ok()?;

    let target = if url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        if url.path() != "/l/" {
            return None;
        }
        let (_, value) = url.query_pairs().find(|(k, _)| k == "uddg")?;
        Url::parse(&value).ok()?
    } else {
        url
    };

    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}
