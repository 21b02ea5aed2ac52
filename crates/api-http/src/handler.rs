//! HTTP Handlers
//!
//! Handlers only persist, enqueue and read. They never wait on the worker.

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{HealthResponse, StatusResponse, SubmitResponse};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use qjob_core::application::{SubmitOutcome, SubmitRequest};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// PUT|POST /job - Submit a circuit.
///
/// Any body is accepted; malformed ones are answered with
/// `400 {"status": "IGNORED"|"FAILED", "reason": ...}`.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<SubmitResponse>) {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Submission body is not JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse::ignored(
                    None,
                    format!("request body is not valid JSON: {}", e),
                )),
            );
        }
    };

    let req = match SubmitRequest::from_body(value) {
        Ok(req) => req,
        Err(reason) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse::ignored(None, reason)),
            )
        }
    };

    match state.jobs.submit(req).await {
        Ok(SubmitOutcome::Submitted { job_id }) => {
            (StatusCode::ACCEPTED, Json(SubmitResponse::submitted(job_id)))
        }
        Ok(SubmitOutcome::Ignored {
            job_id: Some(job_id),
            reason,
        }) => (
            StatusCode::OK,
            Json(SubmitResponse::ignored(Some(job_id), reason)),
        ),
        Ok(SubmitOutcome::Ignored {
            job_id: None,
            reason,
        }) => (
            StatusCode::BAD_REQUEST,
            Json(SubmitResponse::ignored(None, reason)),
        ),
        Ok(SubmitOutcome::Rejected { reason }) => {
            warn!(reason = %reason, "Submission rejected");
            (StatusCode::BAD_REQUEST, Json(SubmitResponse::failed(reason)))
        }
        Err(e) => {
            error!(error = %e, "Submission could not be stored");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmitResponse::failed(format!(
                    "job could not be stored: {}",
                    e
                ))),
            )
        }
    }
}

/// GET /job/{id} - Job status, with result data once terminal.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let view = state
        .jobs
        .status(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    Ok(Json(view.into()))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: qjob_core::VERSION.to_string(),
        queue_size: state.jobs.queue_size(),
    })
}
