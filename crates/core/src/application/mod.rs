// Application Layer - Use Cases and Business Logic

pub mod job_service;
pub mod queue;
pub mod recovery;
pub mod worker;

// Re-exports
pub use job_service::{JobService, JobView, SubmitOutcome, SubmitRequest};
pub use queue::WorkQueue;
pub use recovery::{RecoveryReport, RecoveryService};
pub use worker::{InFlightSlot, Worker};
