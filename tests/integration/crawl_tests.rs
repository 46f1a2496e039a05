//! Fetching, politeness and partial-failure behavior of whole crawls

use crate::common::{create_test_config, mount_page, mount_robots, orchestrator};
use campus_scout::crawler::{build_http_client, CrawlRequest, FetchOutcome, FetchWorker, RateLimiter};
use campus_scout::intent::QueryIntent;
use campus_scout::robots::RobotsGate;
use campus_scout::{CrawlStatus, FetchError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetch_worker(config: &campus_scout::Config) -> FetchWorker {
    let client = build_http_client(config).expect("Failed to build client");
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let robots = Arc::new(RobotsGate::new(client.clone(), config.crawler.respect_robots));
    FetchWorker::new(config, client, limiter, robots)
}

#[tokio::test]
async fn test_robots_disallow_blocks_without_fetching() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private/").await;

    // The page itself must never be requested
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config();
    let worker = fetch_worker(&config);
    let mut request = CrawlRequest::new(format!("{}/private/page", mock_server.uri()), "private", 0, 3);

    let outcome = worker.fetch(&mut request).await;

    assert!(matches!(outcome, FetchOutcome::Blocked { .. }));
    assert_eq!(request.attempt_count, 0);
}

#[tokio::test]
async fn test_blocked_requests_are_not_failures() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private/").await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator(create_test_config());
    let url = format!("{}/private/page", mock_server.uri());

    let result = orchestrator
        .crawl(
            Arc::new(QueryIntent::academic("universities")),
            vec![CrawlRequest::new(url.clone(), "private", 0, 3)],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(result.blocked().collect::<Vec<_>>(), vec![url.as_str()]);
    assert!(result.failed_urls.is_empty());
    assert_eq!(result.status(), CrawlStatus::NothingToCrawl);
}

#[tokio::test]
async fn test_skip_listed_host_is_blocked() {
    let config = create_test_config();
    let worker = fetch_worker(&config);
    let mut request = CrawlRequest::new("https://www.facebook.com/some-university", "fb", 0, 3);

    let outcome = worker.fetch(&mut request).await;

    assert!(matches!(outcome, FetchOutcome::Blocked { .. }));
    assert_eq!(request.attempt_count, 0);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    let worker = fetch_worker(&config);
    let mut request = CrawlRequest::new(format!("{}/gone", mock_server.uri()), "gone", 0, 3);

    let outcome = worker.fetch(&mut request).await;

    match outcome {
        FetchOutcome::Failed { error } => assert!(!error.is_transient()),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(request.attempt_count, 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_up_to_max_attempts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    let worker = fetch_worker(&config);
    let mut request = CrawlRequest::new(format!("{}/flaky", mock_server.uri()), "flaky", 0, 3);

    let outcome = worker.fetch(&mut request).await;

    match outcome {
        FetchOutcome::Failed {
            error: FetchError::Transient { attempts, .. },
        } => assert_eq!(attempts, 3),
        other => panic!("expected transient failure, got {:?}", other),
    }
}

const NAMES: [&str; 10] = [
    "Alder", "Birch", "Cedar", "Dogwood", "Elm", "Fir", "Ginkgo", "Hazel", "Ivy", "Juniper",
];

#[tokio::test]
async fn test_partial_failure_keeps_other_results() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let dead: [usize; 3] = [2, 5, 8];
    let mut requests = Vec::new();
    for i in 0..10usize {
        let route = format!("/page{}", i);
        if dead.contains(&i) {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;
        } else {
            mount_page(
                &mock_server,
                &route,
                &format!("Page {}", i),
                &format!(
                    r#"<p>Partner: <a href="https://www.{}.edu/">{} University</a></p>"#,
                    NAMES[i].to_lowercase(),
                    NAMES[i]
                ),
            )
            .await;
        }
        requests.push(CrawlRequest::new(format!("{}{}", mock_server.uri(), route), "page", 0, 2));
    }

    let orchestrator = orchestrator(create_test_config());
    let result = orchestrator
        .crawl(
            Arc::new(QueryIntent::academic("universities")),
            requests,
            CancellationToken::new(),
        )
        .await;

    let mut expected: Vec<String> = dead
        .iter()
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    expected.sort();

    assert_eq!(result.failed().map(str::to_string).collect::<Vec<_>>(), expected);
    assert_eq!(result.pages_extracted, 7);
    assert_eq!(result.organizations.len(), 7);
    assert_eq!(result.status(), CrawlStatus::Found);
}

#[tokio::test]
async fn test_all_fetches_failed_is_reported_distinctly() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    let orchestrator = orchestrator(config);

    let result = orchestrator
        .crawl(
            Arc::new(QueryIntent::academic("universities")),
            vec![
                CrawlRequest::new(format!("{}/a", mock_server.uri()), "a", 0, 2),
                CrawlRequest::new(format!("{}/b", mock_server.uri()), "b", 0, 2),
            ],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(result.failed_urls.len(), 2);
    assert_eq!(result.status(), CrawlStatus::AllFetchesFailed);
}

#[tokio::test]
async fn test_deadline_stops_dispatch_but_drains_in_flight() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            crate::common::html_page(
                "Slow",
                r#"<a href="https://www.slow.edu/">Slow Example University</a>"#,
            )
            .set_delay(Duration::from_millis(2500)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    config.crawler.max_concurrency = 1;
    config.crawler.deadline_secs = Some(1);
    let orchestrator = orchestrator(config);

    let requests = (0..3)
        .map(|i| CrawlRequest::new(format!("{}/slow{}", mock_server.uri(), i), "slow", 0, 1))
        .collect();

    let caller = CancellationToken::new();
    let result = orchestrator
        .crawl(
            Arc::new(QueryIntent::academic("universities")),
            requests,
            caller.clone(),
        )
        .await;

    assert!(result.cancelled);
    assert!(!caller.is_cancelled(), "deadline leaked into the caller's token");
    assert_eq!(result.requests_dispatched, 1);
    assert_eq!(result.pages_extracted, 1);
    assert_eq!(result.organizations.len(), 1);
}
