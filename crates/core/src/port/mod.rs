// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod simulation_runner;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_store::{JobStore, UnfinishedJob};
pub use simulation_runner::{ExecutionError, NativeConfig, RunOutcome, SimulationRunner};
pub use time_provider::TimeProvider;
