//! Crawl-to-pipeline tests driven by configuration files

use ripple_pipeline::config::load_config;
use ripple_pipeline::crawler::extract_fields;
use ripple_pipeline::pipeline::PipelineError;
use ripple_pipeline::stages::{build_registry, pipeline_order};
use ripple_pipeline::{Crawler, Payload};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_path = dir.join("ripple.toml");
    std::fs::write(&config_path, content).unwrap();
    config_path
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Web Home</title>
            <meta name="description" content="A test site"></head>
            <body><h1>Welcome</h1><p>Web data for every page.</p>
            <a href="/about">About</a></body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>About</title></head><body><p>An article.</p></body></html>",
        ))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_crawl_through_configured_pipeline() {
    let server = mock_site().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("records.db");

    let config_path = write_config(
        dir.path(),
        &format!(
            r#"
seeds = ["{seed}/"]

[crawler]
delay = 0.0
timeout = 5

[[stages]]
name = "validate"
type = "DataValidator"
[stages.options]
required_fields = ["url", "content"]

[[stages]]
name = "classify"
type = "TaxonomyClassifier"

[[stages]]
name = "slim"
type = "DataTransformer"
[stages.options]
hooks = ["drop_content"]

[[stages]]
name = "store"
type = "RecordStore"
[stages.options]
path = '{db}'

[pipeline]
order = ["validate", "classify", "slim", "store"]
"#,
            seed = server.uri(),
            db = db_path.display()
        ),
    );

    let config = load_config(&config_path).unwrap();
    let mut registry = build_registry(&config).unwrap();
    let order = pipeline_order(&config);

    let mut crawler = Crawler::from_config(config.crawler.clone()).unwrap();
    let records = crawler.crawl(&config.seeds[0]).await.unwrap();
    assert_eq!(records.len(), 2);

    let mut outputs = Vec::new();
    for record in &records {
        let fields = extract_fields(&record.content);
        let payload = Payload::Record(record.with_scraped(&fields));
        outputs.push(registry.execute_pipeline(&order, payload).unwrap().into_value());
    }

    let home = &outputs[0];
    assert_eq!(home["validation"]["valid"], true);
    assert_eq!(home["scraped"]["title"], "Web Home");
    assert_eq!(home["scraped"]["meta"]["description"], "A test site");
    assert!(home.get("content").is_none());
    assert_eq!(home["storage"]["status"], "stored");
    assert_eq!(home["storage"]["storage_id"], 1);

    let tags = home["taxonomy"]["tags"].as_array().unwrap();
    assert!(tags.contains(&json!("web")));
    assert!(tags.contains(&json!("data")));
    assert_eq!(outputs[1]["taxonomy"]["tags"], json!(["article"]));

    registry.cleanup_all();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 2);

    let document: String = conn
        .query_row("SELECT payload FROM records ORDER BY id LIMIT 1", [], |row| row.get(0))
        .unwrap();
    let document: Value = serde_json::from_str(&document).unwrap();
    assert_eq!(document["url"], records[0].url.as_str());
}

#[tokio::test]
async fn test_disabled_stage_stops_pipeline() {
    let server = mock_site().await;
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        dir.path(),
        r#"
[crawler]
delay = 0.0
max-depth = 0

[[stages]]
name = "validate"
type = "DataValidator"

[[stages]]
name = "publish"
type = "BuildTrigger"
enabled = false
"#,
    );

    let config = load_config(&config_path).unwrap();
    let mut registry = build_registry(&config).unwrap();

    let mut crawler = Crawler::from_config(config.crawler.clone()).unwrap();
    let records = crawler.crawl(&server.uri()).await.unwrap();
    assert_eq!(records.len(), 1);

    let result = registry.execute_pipeline(&pipeline_order(&config), records[0].clone().into_payload());
    assert!(matches!(result, Err(PipelineError::StageDisabled(name)) if name == "publish"));

    let validated = registry
        .execute_pipeline(&["validate"], records[0].clone().into_payload())
        .unwrap()
        .into_value();
    assert_eq!(validated["validation"]["valid"], true);
}

#[test]
fn test_unknown_stage_type_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        dir.path(),
        r#"
[[stages]]
name = "mystery"
type = "DoesNotExist"
"#,
    );

    let config = load_config(&config_path).unwrap();
    let err = build_registry(&config).unwrap_err();
    assert!(err.to_string().contains("DoesNotExist"));
}
