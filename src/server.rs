//! HTTP endpoint for the usage report
//!
//! Exposes the same read-only queries as the CLI so the status dashboard can
//! poll them. Every request rescans the workspace; nothing is cached between
//! requests and handlers share only immutable configuration.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /api/tokens/usage` | `{ total, byModel, estimatedCost }` |
//! | `GET /api/tokens/sessions` | per-session breakdown |
//! | `GET /health` | `{ "status": "ok" }` |
//!
//! Skipped sessions are logged and counted in the `x-clawstat-warnings`
//! response header; they never appear in the body.

use crate::aggregation::{Aggregator, Totals};
use crate::cost_calculator::CostCalculator;
use crate::data_loader::DataLoader;
use crate::error::{ClawstatError, Result};
use crate::output::sessions_json;
use crate::types::SessionKind;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Header carrying the number of sessions skipped during the scan
pub const WARNINGS_HEADER: HeaderName = HeaderName::from_static("x-clawstat-warnings");

/// Immutable configuration shared by all handlers
#[derive(Debug, Clone)]
pub struct ServerState {
    root: PathBuf,
    cost_calculator: CostCalculator,
    parallel: bool,
}

impl ServerState {
    pub fn new(root: impl Into<PathBuf>, cost_calculator: CostCalculator) -> Self {
        Self {
            root: root.into(),
            cost_calculator,
            parallel: true,
        }
    }

    /// Read transcripts sequentially instead of on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn loader(&self) -> Result<DataLoader> {
        DataLoader::new(&self.root)
    }

    fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.cost_calculator)
    }
}

/// Error returned from a handler, rendered as `{ "error": "<message>" }`
#[derive(Debug)]
pub struct ApiError(ClawstatError);

impl From<ClawstatError> for ApiError {
    fn from(err: ClawstatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionsQuery {
    #[serde(default)]
    subagents: bool,
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tokens/usage", get(usage))
        .route("/api/tokens/sessions", get(sessions))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn run(state: ServerState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ClawstatError::Server(format!("failed to bind {addr}: {e}")))?;

    info!(
        "Serving token usage for {} on http://{}",
        state.root.display(),
        addr
    );

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ClawstatError::Server(e.to_string()))?;

    info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn trace_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn usage(State(state): State<Arc<ServerState>>) -> std::result::Result<Response, ApiError> {
    let loader = state.loader()?;
    let (report, warnings) = state
        .aggregator()
        .scan_report(&loader, state.parallel)
        .await?;

    Ok(with_warnings(Json(report).into_response(), warnings.len()))
}

async fn sessions(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SessionsQuery>,
) -> std::result::Result<Response, ApiError> {
    let loader = state.loader()?;
    let scan = if state.parallel {
        loader.scan_parallel().await?
    } else {
        loader.scan().await?
    };

    let mut sessions = state.aggregator().aggregate_sessions(&scan);
    if query.subagents {
        sessions.retain(|s| s.kind == SessionKind::Subagent);
    }
    let totals = Totals::from_sessions(&sessions);

    let body = Json(sessions_json(&sessions, &totals));
    Ok(with_warnings(body.into_response(), scan.warnings.len()))
}

fn with_warnings(mut response: Response, count: usize) -> Response {
    response
        .headers_mut()
        .insert(WARNINGS_HEADER, HeaderValue::from(count));
    response
}
