//! Router and request handlers

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use desk_core::{AnalysisRequest, Error};
use desk_jobs::{JobDispatcher, JobId, JobStatus};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every handler
pub struct AppState {
    /// Dispatcher owning the store and model clients
    pub dispatcher: JobDispatcher,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analysis", post(create_analysis))
        .route("/analysis/{id}/status", get(get_analysis_status))
        .route("/analysis/{id}", get(get_analysis_result))
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Basic healthcheck used by clients and monitoring
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "desk-api"}))
}

/// Queue a new analysis job
///
/// The job runs asynchronously; the response carries the id and the URLs
/// to poll.
async fn create_analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> impl IntoResponse {
    match state.dispatcher.submit(request.clone()).await {
        Ok(id) => {
            let status_url = format!("/analysis/{id}/status");
            let result_url = format!("/analysis/{id}");
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "analysis_id": id,
                    "status": "queued",
                    "message": "Analysis queued for processing",
                    "symbol": request.symbol,
                    "status_url": status_url,
                    "result_url": result_url,
                })),
            )
        }
        Err(e) => error_response(&e),
    }
}

/// Current status of an analysis
async fn get_analysis_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = JobId::from(id.as_str());
    match state.dispatcher.store().status(&id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::to_value(&summary).unwrap_or_default()),
        ),
        Err(e) => error_response(&e),
    }
}

/// Full result of a completed analysis
///
/// Non-terminal jobs get a 202 progress indicator, failed jobs a 500
/// error payload.
async fn get_analysis_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = JobId::from(id.as_str());
    let record = match state.dispatcher.store().get(&id).await {
        Ok(record) => record,
        Err(e) => return error_response(&e),
    };

    match record.status {
        JobStatus::Queued | JobStatus::Running => (
            StatusCode::ACCEPTED,
            Json(json!({
                "id": record.id,
                "status": record.status,
                "message": "Analysis still in progress, check back shortly",
            })),
        ),
        JobStatus::Failed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "id": record.id,
                "status": record.status,
                "error": record.error,
            })),
        ),
        JobStatus::Completed => (
            StatusCode::OK,
            Json(json!({
                "id": record.id,
                "status": record.status,
                "symbol": record.request.symbol,
                "market": record.request.market,
                "research_depth": record.request.research_depth,
                "llm_provider": record.request.llm_provider,
                "created_at": record.created_at,
                "completed_at": record.completed_at,
                "result": record.result,
            })),
        ),
    }
}

/// Map a core error to its HTTP shape
fn error_response(error: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": error.to_string()})))
}
