//! Extraction and merging over real crawled pages

use crate::common::{create_test_config, mount_page, orchestrator};
use campus_scout::crawler::CrawlRequest;
use campus_scout::dedup::DeduplicationEngine;
use campus_scout::intent::{KeywordAnalyzer, QueryAnalyzer};
use campus_scout::ExtractionMethod;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

const STRUCTURED_PAGE: &str = r#"
    <script type="application/ld+json">
    {
      "@context": "https://schema.org",
      "@type": "CollegeOrUniversity",
      "name": "Example University",
      "url": "https://www.example.edu/",
      "description": "A public research university."
    }
    </script>
    <p>Applications are open.
       <a href="https://apply.example-portal.com/example">Example University (apply now)</a>
    </p>"#;

const LISTICLE_PAGE: &str = r#"
    <h1>Studying abroad</h1>
    <ul>
      <li><a href="https://rankings.example.edu/top-10">Top 10 Universities in Europe</a></li>
      <li><a href="https://www.northfield.edu/">Northfield State University</a></li>
    </ul>
    <p>Read our guide on <a href="https://guides.example.com/best-universities">Best universities for engineering</a>.</p>"#;

fn no_robots_config() -> campus_scout::Config {
    let mut config = create_test_config();
    config.crawler.respect_robots = false;
    config
}

#[tokio::test]
async fn test_structured_data_wins() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/about", "Welcome", STRUCTURED_PAGE).await;

    let orchestrator = orchestrator(no_robots_config());
    let intent = Arc::new(KeywordAnalyzer::new().analyze("universities in the united states"));

    let result = orchestrator
        .crawl(
            intent,
            vec![CrawlRequest::new(format!("{}/about", mock_server.uri()), "about", 0, 2)],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(result.organizations.len(), 1, "{:?}", result.organizations);
    let org = &result.organizations[0];
    assert_eq!(org.name, "Example University");
    assert_eq!(org.method, ExtractionMethod::StructuredData);
    assert!(org.confidence() >= 0.9);
    assert_eq!(org.url.as_deref(), Some("https://www.example.edu/"));
    assert_eq!(org.description.as_deref(), Some("A public research university."));
}

#[tokio::test]
async fn test_listicle_titles_are_vetoed() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/guide", "Guide", LISTICLE_PAGE).await;

    let mut config = no_robots_config();
    // keep the listing links from being crawled
    config.crawler.max_depth = 0;
    let orchestrator = orchestrator(config);
    let intent = Arc::new(KeywordAnalyzer::new().analyze("universities in Europe"));

    let result = orchestrator
        .crawl(
            intent,
            vec![CrawlRequest::new(format!("{}/guide", mock_server.uri()), "guide", 0, 2)],
            CancellationToken::new(),
        )
        .await;

    assert!(result
        .organizations
        .iter()
        .all(|o| !o.name.contains("Top 10") && !o.name.starts_with("Best")));
    assert!(result
        .organizations
        .iter()
        .any(|o| o.name == "Northfield State University"));
    assert!(result
        .organizations
        .iter()
        .all(|o| (0.0..=1.0).contains(&o.confidence())));

    // the vetoed links survive as followable content instead
    assert!(result
        .general_content
        .iter()
        .any(|c| c.title == "Top 10 Universities in Europe" && c.kind.is_followable()));
}

#[tokio::test]
async fn test_merge_of_crawl_output_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/about", "Welcome", STRUCTURED_PAGE).await;
    mount_page(&mock_server, "/guide", "Guide", LISTICLE_PAGE).await;

    let config = no_robots_config();
    let engine = DeduplicationEngine::new(&config.extraction);
    let orchestrator = orchestrator(config);
    let intent = Arc::new(KeywordAnalyzer::new().analyze("universities in Europe"));

    let result = orchestrator
        .crawl(
            intent,
            vec![
                CrawlRequest::new(format!("{}/about", mock_server.uri()), "about", 0, 2),
                CrawlRequest::new(format!("{}/guide", mock_server.uri()), "guide", 0, 2),
            ],
            CancellationToken::new(),
        )
        .await;

    assert!(result.candidates_found >= result.organizations.len());
    let again = engine.merge(result.organizations.clone());
    assert_eq!(again, result.organizations);

    let confidences: Vec<f64> = result.organizations.iter().map(|o| o.confidence()).collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}
