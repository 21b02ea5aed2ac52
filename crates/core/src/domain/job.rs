// Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::run_config::RunConfig;

/// Job ID (UUID v4)
pub type JobId = String;

/// Maximum accepted length of a job id on the query path
const MAX_JOB_ID_LEN: usize = 64;

/// Job Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    PendingInQueue,
    Running,
    Completed,
    Failed,
    Ignored,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "SUBMITTED"),
            JobStatus::PendingInQueue => write!(f, "PENDING_IN_QUEUE"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Ignored => write!(f, "IGNORED"),
        }
    }
}

impl JobStatus {
    /// Terminal states never transition further
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Ignored
        )
    }
}

/// Check that an externally supplied id is a plausible job id.
///
/// Ids are used as file name stems by the store, so only ASCII
/// alphanumerics and `-` are accepted.
pub fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_JOB_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Persisted job input: circuit payload plus run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub created_at: i64, // epoch ms
    pub sequence: u64,   // per-process submission counter
    pub circuit: String,
    pub config: RunConfig,
}

impl JobRecord {
    /// Create a new record
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `sequence` - Submission order within this process
    /// * `circuit` - Circuit description, stored unmodified
    /// * `config` - Run configuration with defaults already applied
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        sequence: u64,
        circuit: impl Into<String>,
        config: RunConfig,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            sequence,
            circuit: circuit.into(),
            config,
        }
    }

    /// Ordering key used when rebuilding the queue after a restart
    pub fn submission_order(&self) -> (i64, u64) {
        (self.created_at, self.sequence)
    }
}

/// Terminal outcome of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobResult {
    /// Simulator's raw structured output
    Completed { data: serde_json::Value },
    /// Execution failed; reason is never empty
    Failed { reason: String },
    /// Payload rejected at submission time
    Ignored { reason: String },
}

impl JobResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "unknown failure".to_string()
        } else {
            reason
        };
        JobResult::Failed { reason }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobResult::Completed { .. } => JobStatus::Completed,
            JobResult::Failed { .. } => JobStatus::Failed,
            JobResult::Ignored { .. } => JobStatus::Ignored,
        }
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            JobResult::Completed { data } => Some(data),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            JobResult::Failed { reason } | JobResult::Ignored { reason } => Some(reason),
            JobResult::Completed { .. } => None,
        }
    }
}

/// Result file contents: the outcome plus when it was recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub result: JobResult,
    pub finished_at: i64, // epoch ms
}

impl ResultRecord {
    pub fn new(result: JobResult, finished_at: i64) -> Self {
        Self {
            result,
            finished_at,
        }
    }
}
