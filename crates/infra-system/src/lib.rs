// QJob Infrastructure - System Adapters
// Implements: SimulationRunner

pub mod output;
pub mod subprocess_runner;

pub use output::classify_output;
pub use subprocess_runner::{SubprocessRunner, SubprocessRunnerConfig, DEFAULT_ENV_ALLOWLIST};
