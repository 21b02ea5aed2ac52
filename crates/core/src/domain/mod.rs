// Domain Layer - Pure business logic and entities

pub mod circuit;
pub mod error;
pub mod job;
pub mod run_config;

// Re-exports
pub use circuit::{validate_circuit, CircuitSummary};
pub use error::DomainError;
pub use job::{is_valid_job_id, JobId, JobRecord, JobResult, JobStatus, ResultRecord};
pub use run_config::{Device, Precision, RunConfig, RunConfigDefaults};
