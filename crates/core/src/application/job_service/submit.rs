// Submit Use Case

use crate::application::queue::WorkQueue;
use crate::domain::{JobId, JobRecord, JobResult, ResultRecord, RunConfig, RunConfigDefaults};
use crate::error::Result;
use crate::port::{IdProvider, JobStore, SimulationRunner, TimeProvider};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Request body field holding the circuit
pub const CIRCUIT_FIELD: &str = "circuit";
/// Accepted alternative spelling of the circuit field
pub const CIRCUIT_FIELD_ALIAS: &str = "qasm";

/// Submission as received from a client
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub circuit: Option<String>,
    /// Loosely typed run configuration fields
    pub options: Map<String, Value>,
}

impl SubmitRequest {
    /// Split a JSON body into circuit and options.
    ///
    /// A circuit field that is not a string counts as missing. Returns the
    /// rejection reason when the body is not a JSON object.
    pub fn from_body(body: Value) -> std::result::Result<Self, String> {
        let mut options = match body {
            Value::Object(map) => map,
            other => {
                return Err(format!(
                    "request body must be a JSON object, got {}",
                    json_kind(&other)
                ))
            }
        };

        let circuit = [CIRCUIT_FIELD, CIRCUIT_FIELD_ALIAS]
            .iter()
            .filter_map(|field| options.remove(*field))
            .find_map(|value| match value {
                Value::String(s) => Some(s),
                _ => None,
            });

        Ok(Self { circuit, options })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Persisted and queued
    Submitted { job_id: JobId },
    /// Payload unusable. `job_id` is set when the job was recorded as IGNORED.
    Ignored { job_id: Option<JobId>, reason: String },
    /// Run configuration malformed; nothing stored
    Rejected { reason: String },
}

pub(super) struct Context<'a> {
    pub store: &'a dyn JobStore,
    pub queue: &'a WorkQueue,
    pub runner: &'a dyn SimulationRunner,
    pub id_provider: &'a dyn IdProvider,
    pub time_provider: &'a dyn TimeProvider,
    pub defaults: &'a RunConfigDefaults,
    pub sequence: &'a AtomicU64,
}

/// Execute submit use case
///
/// Order of checks: circuit presence, run configuration, circuit structure.
/// Only the last one allocates an id for a rejected job.
///
/// # Errors
/// Storage failures. The job is not queued in that case.
pub(super) async fn execute(ctx: Context<'_>, req: SubmitRequest) -> Result<SubmitOutcome> {
    let circuit = match req.circuit {
        Some(circuit) => circuit,
        None => {
            return Ok(SubmitOutcome::Ignored {
                job_id: None,
                reason: format!("missing '{}' field", CIRCUIT_FIELD),
            })
        }
    };

    let config = match RunConfig::from_request(&req.options, ctx.defaults) {
        Ok(config) => config,
        Err(e) => return Ok(SubmitOutcome::Rejected { reason: e.to_string() }),
    };

    let job_id = ctx.id_provider.generate_id();
    let created_at = ctx.time_provider.now_millis();
    let sequence = ctx.sequence.fetch_add(1, Ordering::SeqCst);
    let compiled = ctx.runner.compile(&circuit, &config);
    let record = JobRecord::new(job_id.clone(), created_at, sequence, circuit, config);

    if let Err(e) = compiled {
        let reason = e.to_string();
        warn!(job_id = %job_id, reason = %reason, "Circuit rejected, job ignored");
        // Result first: the job is terminal before its input becomes visible
        let result = ResultRecord::new(JobResult::Ignored { reason: reason.clone() }, created_at);
        ctx.store.put_result(&job_id, &result).await?;
        ctx.store.put_input(&record).await?;
        return Ok(SubmitOutcome::Ignored {
            job_id: Some(job_id),
            reason,
        });
    }

    ctx.store.put_input(&record).await?;
    ctx.queue.enqueue(job_id.clone());

    info!(
        job_id = %job_id,
        shots = record.config.shots,
        queue_size = ctx.queue.size(),
        "Job submitted"
    );
    Ok(SubmitOutcome::Submitted { job_id })
}
