//! SDK Request/Response Types
//!
//! Mirrors the HTTP API's wire format (hyphenated `job-id`, `queue-size`).

use serde::{Deserialize, Serialize};

/// Body of `PUT /job`
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub circuit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shots: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_model: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_unit: Option<u32>,
}

impl SubmitRequest {
    /// Request with server-side defaults for every option
    pub fn new(circuit: impl Into<String>) -> Self {
        Self {
            circuit: circuit.into(),
            device: None,
            precision: None,
            shots: None,
            noise_model: None,
            blocking_enabled: None,
            blocking_unit: None,
        }
    }

    pub fn shots(mut self, shots: u64) -> Self {
        self.shots = Some(shots);
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn precision(mut self, precision: impl Into<String>) -> Self {
        self.precision = Some(precision.into());
        self
    }

    pub fn noise_model(mut self, noise_model: serde_json::Value) -> Self {
        self.noise_model = Some(noise_model);
        self
    }

    pub fn blocking(mut self, enabled: bool, unit: Option<u32>) -> Self {
        self.blocking_enabled = Some(enabled);
        self.blocking_unit = unit;
        self
    }
}

/// Answer to a submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Absent when nothing was stored
    #[serde(rename = "job-id", default)]
    pub job_id: Option<String>,
    /// `SUBMITTED`, `IGNORED` or `FAILED`
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl SubmitResponse {
    pub fn is_submitted(&self) -> bool {
        self.status == "SUBMITTED"
    }
}

/// Answer to `GET /job/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "job-id")]
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "queue-size", default)]
    pub queue_size: Option<usize>,
}

impl StatusResponse {
    /// COMPLETED, FAILED or IGNORED
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "COMPLETED" | "FAILED" | "IGNORED")
    }
}

/// Answer to `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub queue_size: usize,
}
