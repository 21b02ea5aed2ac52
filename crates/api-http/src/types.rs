//! Request/Response Types
//!
//! Wire field names are hyphenated (`job-id`, `queue-size`).

use qjob_core::application::JobView;
use serde::Serialize;

/// PUT|POST /job
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    #[serde(rename = "job-id", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SubmitResponse {
    pub fn submitted(job_id: String) -> Self {
        Self {
            job_id: Some(job_id),
            status: "SUBMITTED".to_string(),
            reason: None,
        }
    }

    pub fn ignored(job_id: Option<String>, reason: String) -> Self {
        Self {
            job_id,
            status: "IGNORED".to_string(),
            reason: Some(reason),
        }
    }

    pub fn failed(reason: String) -> Self {
        Self {
            job_id: None,
            status: "FAILED".to_string(),
            reason: Some(reason),
        }
    }
}

/// GET /job/{id}
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "job-id")]
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "queue-size", skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
}

impl From<JobView> for StatusResponse {
    fn from(view: JobView) -> Self {
        Self {
            job_id: view.id,
            status: view.status.to_string(),
            data: view.data,
            reason: view.reason,
            queue_size: view.queue_size,
        }
    }
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub queue_size: usize,
}
