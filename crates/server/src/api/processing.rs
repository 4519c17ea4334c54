//! Processing API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use labtrack_core::{
    BatchReceipt, BatchReport, JobRequest, SchedulerError, SessionReport, StatusError,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Request body for starting a processing batch.
#[derive(Debug, Deserialize)]
pub struct StartProcessingRequest {
    /// Session directories to process.
    pub session_paths: Vec<String>,
    /// Job kinds to run. Absent or all-false falls back to the configured
    /// empty-request policy.
    #[serde(default)]
    pub jobs: Option<JobRequest>,
    /// Worker budget per session. Absent derives it from the machine.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ProcessingErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// Query for a single session's status.
#[derive(Debug, Deserialize)]
pub struct SessionStatusQuery {
    pub path: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start processing a batch of sessions.
///
/// Returns 202 with the admission receipt; the batch runs in the background.
pub async fn start_processing(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartProcessingRequest>,
) -> Result<(StatusCode, Json<BatchReceipt>), impl IntoResponse> {
    let paths: Vec<PathBuf> = request.session_paths.iter().map(PathBuf::from).collect();
    let jobs = request.jobs.unwrap_or_default();

    match state.scheduler().start(&paths, jobs, request.workers).await {
        Ok(receipt) => Ok((StatusCode::ACCEPTED, Json(receipt))),
        Err(err) => {
            let code = match &err {
                SchedulerError::BatchActive { .. } => StatusCode::CONFLICT,
                SchedulerError::NoValidSessions { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            };
            let error = err.to_string();
            let rejected = match err {
                SchedulerError::NoValidSessions { rejected } => rejected,
                _ => Vec::new(),
            };
            Err((code, Json(ProcessingErrorResponse { error, rejected })))
        }
    }
}

/// Status of the current batch.
pub async fn batch_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BatchReport>, impl IntoResponse> {
    state
        .reporter()
        .batch_report()
        .await
        .map(Json)
        .map_err(status_error_response)
}

/// Status of one session by path.
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionStatusQuery>,
) -> Result<Json<SessionReport>, impl IntoResponse> {
    state
        .reporter()
        .session_report(std::path::Path::new(&query.path))
        .await
        .map(Json)
        .map_err(status_error_response)
}

fn status_error_response(e: StatusError) -> (StatusCode, Json<ProcessingErrorResponse>) {
    let code = match &e {
        StatusError::Session(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StatusError::Tracker(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(ProcessingErrorResponse {
            error: e.to_string(),
            rejected: Vec::new(),
        }),
    )
}
