//! End-to-end crawl tests against mock HTTP servers

use ripple_pipeline::config::CrawlerConfig;
use ripple_pipeline::crawler::{FetchError, SkipReason};
use ripple_pipeline::{Crawler, CrawlError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Crawler settings tuned for tests: no delay, short timeout
fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        delay: 0.0,
        timeout: 5,
        user_agent: "TestBot/1.0".to_string(),
        ..CrawlerConfig::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn paths(records: &[ripple_pipeline::PageRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect()
}

#[tokio::test]
async fn test_crawl_stays_on_seed_host() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="/a">A</a> <a href="/b">B</a> <a href="{}/x">External</a>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/">Home</a>"#).await;
    mount_page(&server, "/b", "leaf").await;
    Mock::given(method("GET"))
        .respond_with(html("external"))
        .expect(0)
        .mount(&other)
        .await;

    let mut crawler = Crawler::from_config(test_config()).unwrap();
    let records = crawler.crawl(&format!("{}/", server.uri())).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/a", "/b"]);
    assert_eq!(records[0].depth, 0);
    assert_eq!(records[1].depth, 1);
    assert!(records.iter().all(|r| r.status_code == 200));
    assert_eq!(crawler.stats().results, 3);
    assert!(crawler.skipped().is_empty());
}

#[tokio::test]
async fn test_external_links_followed_when_enabled() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(&server, "/", &format!(r#"<a href="{}/x">External</a>"#, other.uri())).await;
    mount_page(&other, "/x", "elsewhere").await;

    let config = CrawlerConfig {
        follow_external_links: true,
        ..test_config()
    };
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[1].url.starts_with(&other.uri()));
}

#[tokio::test]
async fn test_page_budget() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#,
    )
    .await;
    for p in ["/1", "/2", "/3"] {
        mount_page(&server, p, "leaf").await;
    }

    let config = CrawlerConfig {
        max_pages: 2,
        ..test_config()
    };
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/1"]);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/deep">Deep</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        max_depth: 1,
        ..test_config()
    };
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/a"]);
}

#[tokio::test]
async fn test_missing_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/missing">M</a><a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "ok").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut crawler = Crawler::from_config(test_config()).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/a"]);

    let skipped = crawler.skipped();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].url.ends_with("/missing"));
    assert!(matches!(
        skipped[0].reason,
        SkipReason::Fetch(FetchError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_seed_gives_empty_result() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{}/", port);

    let mut crawler = Crawler::from_config(test_config()).unwrap();
    let records = crawler.crawl(&uri).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(crawler.skipped().len(), 1);
    assert!(matches!(
        crawler.skipped()[0].reason,
        SkipReason::Fetch(FetchError::Network { .. })
    ));
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let mut crawler = Crawler::from_config(test_config()).unwrap();
    let result = crawler.crawl("ftp://example.com/").await;
    assert!(matches!(result, Err(CrawlError::Url(_))));
}

#[tokio::test]
async fn test_robots_txt_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private">P</a><a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "public").await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        respect_robots: true,
        ..test_config()
    };
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/a"]);
    assert_eq!(crawler.skipped().len(), 1);
    assert_eq!(crawler.skipped()[0].reason, SkipReason::RobotsDenied);
}

#[tokio::test]
async fn test_configured_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("x-crawl-run", "42"))
        .respond_with(html("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config
        .headers
        .insert("X-Crawl-Run".to_string(), "42".to_string());
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_redirect_reports_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/new", "moved").await;

    let config = CrawlerConfig {
        max_depth: 0,
        ..test_config()
    };
    let mut crawler = Crawler::from_config(config).unwrap();
    let records = crawler
        .crawl(&format!("{}/old", server.uri()))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].url.ends_with("/old"));
    assert!(records[0].final_url.ends_with("/new"));
    assert!(records[0].content.contains("moved"));
}
