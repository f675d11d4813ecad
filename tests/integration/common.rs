//! Shared fixtures for the integration tests

use scrape_dispatch::config::UserAgentConfig;
use scrape_dispatch::front::{serve, AppState, ProcessorLink};
use scrape_dispatch::protocol::{EnrichmentReport, FrameCodec, Job, Performance};
use scrape_dispatch::scrape::build_http_client;
use scrape_dispatch::worker::{Dispatcher, Enricher, WorkerPool};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE: &str = r#"<html>
<head>
  <title>Fixture Page</title>
  <meta name="description" content="A page used by the tests">
  <meta property="og:title" content="Fixture">
</head>
<body>
  <h1>Heading</h1>
  <h2>One</h2><h2>Two</h2>
  <a href="/about">About</a>
  <a href="https://other.test/x">Other</a>
  <img src="/img/a.png">
  <img src="b.png">
</body>
</html>"#;

/// Report returned by the stub enricher
pub fn stub_report() -> EnrichmentReport {
    EnrichmentReport {
        screenshot: "c2NyZWVu".to_string(),
        performance: Performance {
            load_time_ms: 42,
            total_size_kb: 1.25,
            num_requests: 2,
        },
        thumbnails: vec![],
    }
}

/// Starts a dispatcher on a loopback port and returns its address
pub async fn spawn_dispatcher<E: Enricher>(enricher: E, workers: usize, job_timeout: Duration) -> SocketAddr {
    let pool = WorkerPool::new(Arc::new(enricher), workers);
    let dispatcher = Dispatcher::bind("127.0.0.1:0", pool, FrameCodec::default(), job_timeout)
        .await
        .expect("Failed to bind dispatcher");
    let addr = dispatcher.local_addr().expect("Failed to read dispatcher address");
    tokio::spawn(dispatcher.run());
    addr
}

/// Starts the front-end pointed at `processor` and returns its base URL
pub async fn spawn_front(processor: SocketAddr, fetch_timeout: Duration) -> String {
    let link = ProcessorLink::new(
        &processor.ip().to_string(),
        processor.port(),
        Duration::from_secs(2),
        Duration::from_secs(10),
        FrameCodec::default(),
    );
    let client = build_http_client(&UserAgentConfig::default()).expect("Failed to build client");
    let state = AppState::new(client, link, fetch_timeout);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind front-end");
    let addr = listener.local_addr().expect("Failed to read front-end address");
    tokio::spawn(serve(listener, state, std::future::pending()));
    format!("http://{}", addr)
}

/// Returns a loopback address nothing is listening on
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("Failed to read address")
}

/// Serves [`PAGE`] at `/`
pub async fn page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;
    server
}

/// Calls `GET /scrape` on the front-end and returns status and JSON body
pub async fn scrape(front: &str, target: Option<&str>) -> (u16, serde_json::Value) {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}/scrape", front));
    if let Some(target) = target {
        request = request.query(&[("url", target)]);
    }

    let response = request.send().await.expect("Request to front-end failed");
    let status = response.status().as_u16();
    let body = response.json().await.expect("Front-end did not return JSON");
    (status, body)
}

/// Stub enricher that always succeeds with [`stub_report`]
pub fn ok_enricher(_job: &Job) -> Result<EnrichmentReport, scrape_dispatch::worker::EnrichmentError> {
    Ok(stub_report())
}
