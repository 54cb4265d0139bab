//! HTTP transport for the fact-check pipeline
//!
//! `POST /api/v1/fact-check` runs one pipeline request; `GET /health` is a liveness probe.
//! A dropped client connection drops the handler future, which cancels in-flight lookups.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::error::{ErrorBody, ErrorKind, FactCheckError};
use crate::models::Report;
use crate::pipeline::{FactCheckPipeline, FactCheckRequest};

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub pipeline: Arc<FactCheckPipeline>,
    pub request_timeout: Duration,
}

impl HttpState {
    pub fn new(pipeline: FactCheckPipeline, request_timeout: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            request_timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope for every fact-check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckResponse {
    pub status: ResponseStatus,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorBody>,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InputError => StatusCode::BAD_REQUEST,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(request_id: Uuid, err: &FactCheckError) -> Response {
    let body = err.to_body();
    let status = status_for(body.kind);
    (
        status,
        Json(FactCheckResponse {
            status: ResponseStatus::Error,
            request_id,
            result: None,
            error: Some(body),
        }),
    )
        .into_response()
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

pub async fn fact_check_handler(
    State(state): State<HttpState>,
    payload: Result<Json<FactCheckRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let err = FactCheckError::input(format!("invalid request body: {}", rejection.body_text()));
            return error_response(request_id, &err);
        }
    };

    info!("request {}: fact-check started", request_id);
    let token = CancellationToken::new();
    let deadline = {
        let token = token.clone();
        let timeout = state.request_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel();
        })
    };
    let outcome = state.pipeline.run_request(request, token).await;
    deadline.abort();

    match outcome {
        Ok(report) => {
            info!(
                "request {}: {} claims, reliability={:?}",
                request_id, report.total_claims, report.reliability
            );
            (
                StatusCode::OK,
                Json(FactCheckResponse {
                    status: ResponseStatus::Success,
                    request_id,
                    result: Some(report),
                    error: None,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("request {}: {}", request_id, e);
            error_response(request_id, &e)
        }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/fact-check", post(fact_check_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(
    pipeline: FactCheckPipeline,
    runtime: &RuntimeConfig,
) -> anyhow::Result<()> {
    let state = HttpState::new(
        pipeline,
        Duration::from_millis(runtime.http_request_timeout_ms),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(runtime.http_bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    info!("Starting HTTP server on {}", runtime.http_bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
