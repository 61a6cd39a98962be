//! HTTP trigger endpoint
//!
//! - `GET /` returns a welcome message
//! - `POST /scrape` runs one harvest and returns its summary
//!
//! `/scrape` requires the `api-key-header` header to equal the configured
//! token. The engine sits behind an async mutex, so concurrent requests run
//! one after another.

use crate::crawler::{CrawlEngine, CrawlSummary, RunOptions};
use crate::HarvestError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Header carrying the API token
pub const API_KEY_HEADER: &str = "api-key-header";

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<CrawlEngine>>,
    auth_token: Arc<str>,
}

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the router serving `engine`
pub fn router(engine: CrawlEngine, auth_token: impl Into<String>) -> Router {
    let state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        auth_token: Arc::from(auth_token.into()),
    };

    Router::new()
        .route("/", get(root))
        .route("/scrape", post(scrape))
        .with_state(state)
}

/// Binds `bind` and serves the endpoint until the process stops
pub async fn serve(bind: &str, engine: CrawlEngine, auth_token: String) -> Result<(), HarvestError> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| HarvestError::Server(format!("invalid bind address {}: {}", bind, e)))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(engine, auth_token)).await?;
    Ok(())
}

async fn root() -> Json<Message> {
    Json(Message {
        message: "Welcome to the Product Scraping Tool API",
    })
}

/// The body is parsed only after the API key is checked, so unauthenticated
/// requests get 403 whatever they carry. An empty body means default options.
async fn scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CrawlSummary>, ApiError> {
    let authorized = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| token == &*state.auth_token);

    if !authorized {
        tracing::warn!("Rejected /scrape request with missing or wrong API key");
        return Err(error(StatusCode::FORBIDDEN, "Unauthorized"));
    }

    let options = parse_options(&body)?;

    let mut engine = state.engine.lock().await;
    tracing::info!(
        "Harvest requested (max pages: {:?}, proxy: {})",
        options.max_pages,
        options.proxy.is_some()
    );

    match engine.run(options).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn parse_options(body: &[u8]) -> Result<RunOptions, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunOptions::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid scrape options: {}", e),
        )
    })
}

fn error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}
