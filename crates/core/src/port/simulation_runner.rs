// Simulation Runner Port
// Abstraction over the external simulator executable

use crate::domain::{validate_circuit, Device, DomainError, Precision, RunConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulator method requested for every job
pub const SIMULATION_METHOD: &str = "statevector";

/// Options block of the native configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorOptions {
    pub method: String,
    pub device: Device,
    pub precision: Precision,
    pub shots: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_model: Option<serde_json::Value>,
    pub blocking_enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_qubits: Option<u32>,
}

/// Document handed to the simulator on stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeConfig {
    /// Circuit text, unmodified
    pub circuit: String,
    pub n_qubits: u32,
    pub config: SimulatorOptions,
}

impl NativeConfig {
    /// Validate a circuit and translate the run configuration into simulator
    /// options. Shots are passed through unchanged.
    pub fn compile(circuit: &str, config: &RunConfig) -> Result<Self, DomainError> {
        let summary = validate_circuit(circuit)?;
        if config.shots == 0 {
            return Err(DomainError::InvalidRunConfig(
                "shots must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            circuit: circuit.to_string(),
            n_qubits: summary.num_qubits,
            config: SimulatorOptions {
                method: SIMULATION_METHOD.to_string(),
                device: config.device,
                precision: config.precision,
                shots: config.shots,
                noise_model: config.noise_model.clone(),
                blocking_enable: config.blocking_enabled,
                blocking_qubits: config.blocking_enabled.then_some(config.blocking_unit),
            },
        })
    }
}

/// Classified result of one simulator run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Structured simulator output
    Success(serde_json::Value),
    /// Abnormal exit or unusable output
    Crash(String),
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Simulation timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Simulation Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns the external simulator executable
#[async_trait]
pub trait SimulationRunner: Send + Sync {
    /// Translate a circuit and run configuration into the native format.
    ///
    /// # Errors
    /// - DomainError::InvalidCircuit if the circuit is structurally malformed
    fn compile(&self, circuit: &str, config: &RunConfig) -> Result<NativeConfig, DomainError> {
        NativeConfig::compile(circuit, config)
    }

    /// Run the simulator to completion and classify its output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the executable cannot be started
    /// - ExecutionError::Timeout if the run exceeds the configured deadline
    async fn execute(&self, native: &NativeConfig) -> Result<RunOutcome, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return Success with this output
        Success(serde_json::Value),
        /// Return Crash with this reason
        Crash(String),
        /// Fail to launch
        SpawnFail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Report a deadline expiry
        Timeout(u64),
    }

    /// Mock Simulation Runner for testing
    pub struct MockSimulationRunner {
        default: MockBehavior,
        scripted: Mutex<VecDeque<MockBehavior>>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl MockSimulationRunner {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                scripted: Mutex::new(VecDeque::new()),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }

        /// Succeed with counts splitting all shots between `00` and `11`
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success(serde_json::Value::Null))
        }

        pub fn new_crash(reason: impl Into<String>) -> Self {
            Self::new(MockBehavior::Crash(reason.into()))
        }

        /// Hold each execution for `delay`
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Behaviors consumed one per call before falling back to the default
        pub fn with_script(self, behaviors: impl IntoIterator<Item = MockBehavior>) -> Self {
            self.scripted.lock().unwrap().extend(behaviors);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Circuits in the order they were executed
        pub fn executed_circuits(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Highest number of overlapping executions observed
        pub fn max_concurrent(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }

        pub fn shared(self) -> Arc<Self> {
            Arc::new(self)
        }
    }

    pub fn counts_for(shots: u64) -> serde_json::Value {
        let half = shots / 2;
        serde_json::json!({
            "success": true,
            "results": [{
                "shots": shots,
                "data": {"counts": {"0x0": half, "0x3": shots - half}}
            }]
        })
    }

    struct ActiveGuard<'a>(&'a AtomicUsize);

    impl Drop for ActiveGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SimulationRunner for MockSimulationRunner {
        async fn execute(&self, native: &NativeConfig) -> Result<RunOutcome, ExecutionError> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = ActiveGuard(&self.active);
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.calls.lock().unwrap().push(native.circuit.clone());

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let behavior = self
                .scripted
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default.clone());

            match behavior {
                MockBehavior::Success(serde_json::Value::Null) => {
                    Ok(RunOutcome::Success(counts_for(native.config.shots)))
                }
                MockBehavior::Success(value) => Ok(RunOutcome::Success(value)),
                MockBehavior::Crash(reason) => Ok(RunOutcome::Crash(reason)),
                MockBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}
