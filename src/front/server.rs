//! HTTP surface of the front-end
//!
//! Routes:
//! - `GET /scrape?url=<target>` - scrape, enrich and consolidate one page
//! - `GET /health` - liveness check

use crate::config::Config;
use crate::front::processor::ProcessorLink;
use crate::front::record::{ErrorResponse, ScrapeRecord, ScrapeResponse, ScrapingData};
use crate::protocol::Job;
use crate::scrape::{build_http_client, extract_meta_tags, fetch_page, parse_html, FetchError};
use crate::url::normalize_target;
use crate::DispatchError;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared state of the front-end
///
/// The HTTP client is long-lived and pools connections across requests; the
/// dispatcher link opens a new connection per job.
#[derive(Debug, Clone)]
pub struct AppState {
    client: reqwest::Client,
    processor: ProcessorLink,
    fetch_timeout: Duration,
}

impl AppState {
    pub fn new(client: reqwest::Client, processor: ProcessorLink, fetch_timeout: Duration) -> Self {
        Self {
            client,
            processor,
            fetch_timeout,
        }
    }

    /// Builds the state from configuration
    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        let client = build_http_client(&config.user_agent)?;
        let processor = ProcessorLink::from_config(&config.front, &config.protocol);
        Ok(Self::new(
            client,
            processor,
            Duration::from_secs(config.front.fetch_timeout_secs),
        ))
    }
}

/// Query string of `/scrape`
#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    pub url: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Builds the front-end router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scrape", get(scrape_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), DispatchError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        "Scrape server listening on {} (processing server: {})",
        listener.local_addr()?,
        state.processor.addr()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Scrape server stopped");
    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn scrape_handler(
    State(state): State<AppState>,
    params: Result<Query<ScrapeParams>, QueryRejection>,
) -> Response {
    let (status, body) = match params {
        Ok(Query(params)) => scrape(&state, params.url.as_deref()).await,
        Err(rejection) => {
            tracing::warn!("Rejected query string: {}", rejection.body_text());
            error_response(
                StatusCode::BAD_REQUEST,
                None,
                format!("Invalid query string: {}", rejection.body_text()),
            )
        }
    };
    (status, Json(body)).into_response()
}

/// Handles one scrape request end to end
///
/// # Flow
///
/// 1. Reject a missing target (400) and normalize it (`http://` prefix)
/// 2. Fetch the page; timeout is 504, any other fetch failure is 502
/// 3. Parse title, links, images, headings and meta tags
/// 4. Send the job to the dispatcher over a fresh connection
/// 5. Consolidate: `success`, or `partial_success` if enrichment failed
///
/// Steps are strictly sequential within a request: the job needs the image
/// URLs found by the parser.
pub async fn scrape(state: &AppState, target: Option<&str>) -> (StatusCode, ScrapeResponse) {
    let Some(raw) = target.filter(|t| !t.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, None, "Missing \"url\" query parameter");
    };

    let url = match normalize_target(raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Rejected target {:?}: {}", raw, e);
            return error_response(
                StatusCode::BAD_REQUEST,
                Some(raw.to_string()),
                format!("Invalid url: {}", e),
            );
        }
    };

    tracing::info!("Processing URL: {}", url);

    let html = match fetch_page(&state.client, url.as_str(), state.fetch_timeout).await {
        Ok(html) => html,
        Err(e @ FetchError::Timeout { .. }) => {
            tracing::warn!("{}", e);
            return error_response(StatusCode::GATEWAY_TIMEOUT, Some(url.to_string()), e.to_string());
        }
        Err(e @ FetchError::Network { .. }) => {
            tracing::error!("{}", e);
            return error_response(StatusCode::BAD_GATEWAY, Some(url.to_string()), e.to_string());
        }
    };

    let page = parse_html(&html, &url);
    let meta_tags = extract_meta_tags(&html);

    let job = Job::new(url.as_str(), page.image_urls.clone());
    let scraping_data = ScrapingData::new(page, meta_tags);

    let processing_data = state.processor.request_enrichment(&job).await;
    if let Some(error) = processing_data.error() {
        tracing::warn!("Error received from processing server: {}", error);
    }

    let record = ScrapeRecord::consolidate(url.as_str(), scraping_data, processing_data);
    tracing::info!("Finished {} with status {:?}", record.url, record.status);

    (StatusCode::OK, ScrapeResponse::Record(Box::new(record)))
}

fn error_response(
    status: StatusCode,
    url: Option<String>,
    message: impl Into<String>,
) -> (StatusCode, ScrapeResponse) {
    (status, ScrapeResponse::Error(ErrorResponse::new(url, message)))
}
