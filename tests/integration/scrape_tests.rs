//! End-to-end tests through the HTTP front-end and the dispatcher

use crate::common::{
    closed_addr, ok_enricher, page_server, scrape, spawn_dispatcher, spawn_front, stub_report,
};
use scrape_dispatch::protocol::{EnrichmentReport, Job};
use scrape_dispatch::worker::EnrichmentError;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scrape_success_end_to_end() {
    let pages = page_server().await;

    let seen: Arc<Mutex<Vec<Job>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let processor = spawn_dispatcher(
        move |job: &Job| {
            recorder.lock().unwrap().push(job.clone());
            Ok::<_, EnrichmentError>(stub_report())
        },
        2,
        Duration::from_secs(5),
    )
    .await;
    let front = spawn_front(processor, Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&pages.uri())).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["processing_data"]["performance"]["num_requests"], json!(2));
    assert_eq!(body["processing_data"]["screenshot"], json!("c2NyZWVu"));

    let scraping = &body["scraping_data"];
    assert_eq!(scraping["title"], json!("Fixture Page"));
    assert_eq!(scraping["images_count"], json!(2));
    assert_eq!(scraping["structure"]["h1"], json!(1));
    assert_eq!(scraping["structure"]["h2"], json!(2));
    assert_eq!(scraping["structure"]["h6"], json!(0));
    assert_eq!(scraping["meta_tags"]["description"], json!("A page used by the tests"));
    assert_eq!(scraping["meta_tags"]["og:title"], json!("Fixture"));
    assert_eq!(scraping["links"].as_array().unwrap().len(), 2);
    assert!(body["timestamp"].is_string());

    // The job carries the absolute image URLs found by the parser
    let jobs = seen.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0].image_urls,
        vec![format!("{}/img/a.png", pages.uri()), format!("{}/b.png", pages.uri())]
    );
}

#[tokio::test]
async fn test_scheme_is_added_to_bare_target() {
    let pages = page_server().await;
    let processor = spawn_dispatcher(ok_enricher, 1, Duration::from_secs(5)).await;
    let front = spawn_front(processor, Duration::from_secs(5)).await;

    let bare = pages.uri().trim_start_matches("http://").to_string();
    let (status, body) = scrape(&front, Some(&bare)).await;

    assert_eq!(status, 200);
    assert!(body["url"].as_str().unwrap().starts_with("http://"));
    assert_eq!(body["status"], json!("success"));
}

#[tokio::test]
async fn test_failing_enricher_is_partial_success() {
    let pages = page_server().await;
    let processor = spawn_dispatcher(
        |_job: &Job| Err::<EnrichmentReport, _>(EnrichmentError::Other("browser crashed".into())),
        1,
        Duration::from_secs(5),
    )
    .await;
    let front = spawn_front(processor, Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&pages.uri())).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], json!("partial_success"));
    assert_eq!(body["processing_data"]["status"], json!("error"));
    assert!(body["processing_data"]["error"]
        .as_str()
        .unwrap()
        .contains("browser crashed"));
    assert_eq!(body["scraping_data"]["title"], json!("Fixture Page"));
}

#[tokio::test]
async fn test_panicking_enricher_is_partial_success() {
    let pages = page_server().await;
    let processor = spawn_dispatcher(
        |_job: &Job| -> Result<EnrichmentReport, EnrichmentError> { panic!("renderer exploded") },
        1,
        Duration::from_secs(5),
    )
    .await;
    let front = spawn_front(processor, Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&pages.uri())).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], json!("partial_success"));
    assert!(body["processing_data"]["error"]
        .as_str()
        .unwrap()
        .contains("renderer exploded"));

    // The dispatcher survives and serves the next job
    let (_, body) = scrape(&front, Some(&pages.uri())).await;
    assert_eq!(body["status"], json!("partial_success"));
}

#[tokio::test]
async fn test_job_deadline_is_partial_success() {
    let pages = page_server().await;
    let processor = spawn_dispatcher(
        |_job: &Job| {
            std::thread::sleep(Duration::from_millis(800));
            Ok::<_, EnrichmentError>(stub_report())
        },
        1,
        Duration::from_millis(100),
    )
    .await;
    let front = spawn_front(processor, Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&pages.uri())).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], json!("partial_success"));
    assert!(body["processing_data"]["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn test_unreachable_dispatcher_is_partial_success() {
    let pages = page_server().await;
    let front = spawn_front(closed_addr(), Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&pages.uri())).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], json!("partial_success"));
    assert_eq!(body["scraping_data"]["title"], json!("Fixture Page"));
    assert!(!body["processing_data"]["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_url_is_400() {
    let front = spawn_front(closed_addr(), Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, None).await;

    assert_eq!(status, 400);
    assert_eq!(body["status"], json!("error"));
    assert!(body["message"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn test_upstream_404_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let front = spawn_front(closed_addr(), Duration::from_secs(5)).await;

    let (status, body) = scrape(&front, Some(&format!("{}/missing", server.uri()))).await;

    assert_eq!(status, 502);
    assert_eq!(body["status"], json!("error"));
}

#[tokio::test]
async fn test_slow_upstream_is_504() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let front = spawn_front(closed_addr(), Duration::from_millis(200)).await;

    let (status, body) = scrape(&front, Some(&server.uri())).await;

    assert_eq!(status, 504);
    assert_eq!(body["status"], json!("error"));
}

#[tokio::test]
async fn test_health_route() {
    let front = spawn_front(closed_addr(), Duration::from_secs(5)).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", front))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn test_malformed_query_is_json_400() {
    let front = spawn_front(closed_addr(), Duration::from_secs(5)).await;

    let response = reqwest::get(format!("{}/scrape?url=a.test&url=b.test", front))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("error"));
    assert!(body["url"].is_null());
    assert!(body["message"].as_str().unwrap().contains("query string"));
}
