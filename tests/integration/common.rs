//! Shared helpers for the integration tests

use campus_scout::config::Config;
use campus_scout::intent::KeywordAnalyzer;
use campus_scout::CrawlOrchestrator;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration with short delays suitable for mock servers
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrency = 4;
    config.crawler.request_timeout_secs = 5;
    config.rate_limit.min_interval_ms = 1;
    config.rate_limit.search_interval_ms = 1;
    config.rate_limit.initial_delay_ms = 1;
    config.rate_limit.max_delay_ms = 10;
    config.search.max_retries = 1;
    config
}

pub fn orchestrator(config: Config) -> CrawlOrchestrator {
    CrawlOrchestrator::new(Arc::new(config), Arc::new(KeywordAnalyzer::new()))
        .expect("Failed to create orchestrator")
}

/// An HTML response with the given title and body
pub fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a robots.txt with the given content
pub async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

/// Mounts an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}
