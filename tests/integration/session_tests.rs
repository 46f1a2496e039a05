//! Full sessions: query analysis, search, crawl and output

use crate::common::{create_test_config, mount_page, orchestrator};
use campus_scout::config::load_config_with_hash;
use campus_scout::output::{configured_sinks, write_all, RunReport};
use campus_scout::search::{DuckDuckGoProvider, SearchHit, StaticProvider};
use campus_scout::CrawlStatus;
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNIVERSITY_PAGE: &str = r#"
    <script type="application/ld+json">
    {"@context": "https://schema.org", "@type": "CollegeOrUniversity",
     "name": "Riverside Technical University", "url": "https://www.riverside-tech.edu/"}
    </script>
    <p>Welcome to our campus.</p>"#;

fn results_page(targets: &[String]) -> String {
    let mut html = String::from(r#"<html><body><div class="results">"#);
    for (i, target) in targets.iter().enumerate() {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        html.push_str(&format!(
            r#"<div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg={}&amp;rut=x">Result {}</a>
               <a class="result__snippet">snippet</a></div>"#,
            encoded, i
        ));
    }
    html.push_str("</div></body></html>");
    html
}

#[tokio::test]
async fn test_session_through_search_provider() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/riverside", "Riverside", UNIVERSITY_PAGE).await;

    let targets = vec![format!("{}/riverside", mock_server.uri())];
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "technical universities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&targets)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.search.endpoint = format!("{}/html/", mock_server.uri());
    let provider = DuckDuckGoProvider::new(reqwest::Client::new(), &config.search).unwrap();
    let orchestrator = orchestrator(config);

    let session = orchestrator
        .run_session("technical universities", &provider, CancellationToken::new())
        .await;

    assert_eq!(session.hits.len(), 1);
    assert_eq!(session.hits[0].url, targets[0]);
    assert_eq!(session.result.status(), CrawlStatus::Found);
    assert_eq!(session.result.organizations[0].name, "Riverside Technical University");
}

#[tokio::test]
async fn test_relevant_hits_are_fetched_first() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a-flights", "Flights", "<p>Book a flight.</p>").await;
    mount_page(&mock_server, "/b-news", "News", "<p>Headlines.</p>").await;
    mount_page(&mock_server, "/c-physics", "Physics", UNIVERSITY_PAGE).await;

    // URL order alone would fetch these alphabetically
    let provider = StaticProvider::new(vec![
        SearchHit::new("Cheap Flights", format!("{}/a-flights", mock_server.uri()), "Book now"),
        SearchHit::new("Universities Daily", format!("{}/b-news", mock_server.uri()), "Headlines"),
        SearchHit::new(
            "Best Physics Universities in Germany",
            format!("{}/c-physics", mock_server.uri()),
            "Study physics at a German university",
        ),
    ]);

    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    config.crawler.max_concurrency = 1;
    config.crawler.max_depth = 0;
    let orchestrator = orchestrator(config);

    orchestrator
        .run_session("physics universities in germany", &provider, CancellationToken::new())
        .await;

    let fetched: Vec<String> = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(fetched, vec!["/c-physics", "/b-news", "/a-flights"]);
}

#[tokio::test]
async fn test_rate_limited_search_degrades_to_empty_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.search.endpoint = format!("{}/html/", mock_server.uri());
    config.search.max_retries = 2;
    config.search.initial_delay_ms = 1;
    config.search.max_delay_ms = 10;
    let provider = DuckDuckGoProvider::new(reqwest::Client::new(), &config.search).unwrap();
    let orchestrator = orchestrator(config);

    let session = orchestrator
        .run_session("universities", &provider, CancellationToken::new())
        .await;

    assert!(session.hits.is_empty());
    assert_eq!(session.result.requests_dispatched, 0);
    assert_eq!(session.result.status(), CrawlStatus::NothingToCrawl);
}

#[tokio::test]
async fn test_config_file_drives_session_and_sinks() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/riverside", "Riverside", UNIVERSITY_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/dead"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("results.json");
    let db_path = dir.path().join("results.db");
    let summary_path = dir.path().join("summary.md");
    let config_path = dir.path().join("config.toml");

    std::fs::write(
        &config_path,
        format!(
            r#"
[crawler]
max-concurrency = 2
respect-robots = false

[rate-limit]
min-interval-ms = 1
search-interval-ms = 1
initial-delay-ms = 1
max-delay-ms = 10

[search]
max-retries = 1
initial-delay-ms = 1
max-delay-ms = 10

[output]
json-path = "{}"
database-path = "{}"
summary-path = "{}"
"#,
            json_path.display(),
            db_path.display(),
            summary_path.display()
        ),
    )
    .unwrap();

    let (config, hash) = load_config_with_hash(&config_path).unwrap();
    assert_eq!(hash.len(), 64);

    let provider = StaticProvider::from_urls(&[
        format!("{}/riverside", mock_server.uri()),
        format!("{}/dead", mock_server.uri()),
    ]);
    let sinks = configured_sinks(&config.output);
    let orchestrator = orchestrator(config);

    let session = orchestrator
        .run_session("technical universities", &provider, CancellationToken::new())
        .await;
    let report = RunReport::new(&session.intent, Some(hash.clone()))
        .with_search_hits(session.hits.len())
        .finish();

    assert_eq!(write_all(&sinks, &session.result, &report), 0);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["status"], "found");
    assert_eq!(json["organizations"][0]["name"], "Riverside Technical University");
    assert_eq!(json["failed_urls"].as_array().unwrap().len(), 1);

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("Riverside Technical University"));
    assert!(summary.contains(&hash));

    let conn = Connection::open(&db_path).unwrap();
    let orgs: i64 = conn
        .query_row("SELECT COUNT(*) FROM organizations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orgs, 1);
}
