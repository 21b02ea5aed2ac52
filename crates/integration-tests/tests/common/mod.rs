//! Shared wiring for end-to-end tests: real file store, real subprocess
//! runner driving a shell-script stand-in for the simulator.

#![allow(dead_code)]

use async_trait::async_trait;
use qjob_core::application::{
    InFlightSlot, JobService, JobView, RecoveryReport, RecoveryService, SubmitOutcome,
    SubmitRequest, WorkQueue, Worker,
};
use qjob_core::domain::{JobStatus, RunConfig, RunConfigDefaults};
use qjob_core::port::id_provider::UuidProvider;
use qjob_core::port::time_provider::SystemTimeProvider;
use qjob_core::port::{
    ExecutionError, JobStore, NativeConfig, RunOutcome, SimulationRunner, TimeProvider,
};
use qjob_infra_fs::FsJobStore;
use qjob_infra_system::{SubprocessRunner, SubprocessRunnerConfig};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Reads the native config on stdin, crashes when the circuit mentions
/// CRASH, otherwise splits all shots between `00` and `11`.
pub const FAKE_SIMULATOR: &str = r#"
input=$(cat)
case "$input" in
  *CRASH*) echo "simulated segfault" >&2; exit 139 ;;
esac
shots=$(printf '%s' "$input" | sed -n 's/.*"shots":\([0-9]*\).*/\1/p')
sleep 0.2
half=$((shots / 2))
echo "Simulating circuit..."
printf '{"success":true,"results":[{"shots":%s,"data":{"counts":{"0x0":%s,"0x3":%s}}}]}\n' "$shots" "$half" "$((shots - half))"
"#;

pub const BELL_QASM: &str = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q -> c;
"#;

pub const CRASHING_QASM: &str = r#"OPENQASM 2.0;
// CRASH
qreg q[1];
x q[0];
"#;

/// Passes calls through and records the circuits in execution order
pub struct RecordingRunner {
    inner: SubprocessRunner,
    circuits: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn executed(&self) -> Vec<String> {
        self.circuits.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimulationRunner for RecordingRunner {
    async fn execute(&self, native: &NativeConfig) -> Result<RunOutcome, ExecutionError> {
        self.circuits.lock().unwrap().push(native.circuit.clone());
        self.inner.execute(native).await
    }
}

pub fn script_runner(script: &str, timeout: Duration) -> RecordingRunner {
    let config = SubprocessRunnerConfig::new("sh")
        .with_args(vec!["-c".to_string(), script.to_string()])
        .with_timeout(timeout)
        .with_kill_grace(Duration::from_millis(500));
    RecordingRunner {
        inner: SubprocessRunner::new(config, Arc::new(SystemTimeProvider)),
        circuits: Mutex::new(Vec::new()),
    }
}

pub struct TestSystem {
    pub store: Arc<FsJobStore>,
    pub queue: Arc<WorkQueue>,
    pub runner: Arc<RecordingRunner>,
    pub jobs: Arc<JobService>,
    pub recovery: RecoveryReport,
    worker_task: JoinHandle<()>,
}

impl Drop for TestSystem {
    fn drop(&mut self) {
        self.worker_task.abort();
    }
}

/// Open the store in `data_dir`, run recovery and start the worker
pub async fn start_system(data_dir: &Path) -> TestSystem {
    start_system_with(data_dir, FAKE_SIMULATOR, Duration::from_secs(30)).await
}

pub async fn start_system_with(data_dir: &Path, script: &str, timeout: Duration) -> TestSystem {
    let store = Arc::new(FsJobStore::open(data_dir).await.unwrap());
    let queue = Arc::new(WorkQueue::new());
    let slot = Arc::new(InFlightSlot::new());
    let runner = Arc::new(script_runner(script, timeout));
    let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    let recovery = RecoveryService::new(store.clone(), queue.clone(), time.clone())
        .recover()
        .await
        .unwrap();

    let worker = Worker::new(
        queue.clone(),
        store.clone(),
        runner.clone(),
        slot.clone(),
        time.clone(),
    );
    let worker_task = tokio::spawn(async move { worker.run().await });

    let jobs = Arc::new(JobService::new(
        store.clone(),
        queue.clone(),
        runner.clone(),
        slot,
        Arc::new(UuidProvider),
        time,
        RunConfigDefaults::default(),
    ));

    TestSystem {
        store,
        queue,
        runner,
        jobs,
        recovery,
        worker_task,
    }
}

impl TestSystem {
    pub async fn submit(&self, circuit: &str, shots: u64) -> String {
        let body = serde_json::json!({ "circuit": circuit, "shots": shots });
        match self
            .jobs
            .submit(SubmitRequest::from_body(body).unwrap())
            .await
            .unwrap()
        {
            SubmitOutcome::Submitted { job_id } => job_id,
            other => panic!("submission not accepted: {:?}", other),
        }
    }

    pub async fn status(&self, id: &str) -> JobView {
        self.jobs.status(id).await.unwrap().expect("known job")
    }

    /// Poll until terminal, recording every status seen
    pub async fn wait_terminal(&self, id: &str) -> (JobView, Vec<JobStatus>) {
        let mut seen = Vec::new();
        for _ in 0..500 {
            let view = self.status(id).await;
            if seen.last() != Some(&view.status) {
                seen.push(view.status);
            }
            if view.status.is_terminal() {
                return (view, seen);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} did not finish; saw {:?}", id, seen);
    }
}

pub fn default_config() -> RunConfig {
    RunConfig::from_defaults(&RunConfigDefaults::default())
}

/// Sum of all measurement counts in a COMPLETED result
pub fn total_counts(data: &serde_json::Value) -> u64 {
    data["results"][0]["data"]["counts"]
        .as_object()
        .expect("counts object")
        .values()
        .filter_map(|v| v.as_u64())
        .sum()
}

pub async fn store_has_result(store: &FsJobStore, id: &str) -> bool {
    store.load_result(&id.to_string()).await.unwrap().is_some()
}
