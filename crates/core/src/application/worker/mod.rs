// Worker - Simulation execution loop

pub mod constants;
mod in_flight;

use constants::*;
pub use in_flight::InFlightSlot;

use crate::application::queue::WorkQueue;
use crate::domain::{JobId, JobRecord, JobResult, JobStatus, ResultRecord};
use crate::error::{AppError, Result};
use crate::port::{RunOutcome, SimulationRunner, TimeProvider};
use crate::port::JobStore;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// The single consumer of the work queue.
///
/// Only one job is ever executed at a time: exclusivity of the simulator
/// follows from there being exactly one `Worker` per queue.
pub struct Worker {
    queue: Arc<WorkQueue>,
    store: Arc<dyn JobStore>,
    runner: Arc<dyn SimulationRunner>,
    in_flight: Arc<InFlightSlot>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Worker {
    pub fn new(
        queue: Arc<WorkQueue>,
        store: Arc<dyn JobStore>,
        runner: Arc<dyn SimulationRunner>,
        in_flight: Arc<InFlightSlot>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue,
            store,
            runner,
            in_flight,
            time_provider,
        }
    }

    /// Run the worker loop for the lifetime of the process.
    ///
    /// Idle -> Dequeuing -> Running -> Persisting -> Idle. A failure on one
    /// job is logged and the loop moves on to the next queue item.
    pub async fn run(&self) {
        info!("Worker started");
        loop {
            let job_id = self.queue.dequeue().await;
            match self.process_job(&job_id).await {
                Ok(Some(status)) => {
                    info!(job_id = %job_id, status = %status, "Job finished");
                }
                Ok(None) => {}
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Worker error");
                    sleep(ERROR_RECOVERY_SLEEP_DURATION).await;
                }
            }
        }
    }

    /// Execute one dequeued job and persist its terminal result.
    ///
    /// Returns the terminal status, or `None` when the id was skipped
    /// (unknown, or already finished). A store failure while loading the job
    /// finishes it as FAILED.
    pub async fn process_job(&self, job_id: &JobId) -> Result<Option<JobStatus>> {
        self.flush_held_results().await;

        let record = match self.load_pending(job_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to load dequeued job");
                let result = JobResult::failed(format!("{}: {}", STORE_UNAVAILABLE_REASON, e));
                return self.finish(job_id, result).await.map(Some);
            }
        };

        // Visible as RUNNING before the simulator starts
        self.in_flight.set(job_id);
        let started_at = self.time_provider.now_millis();
        if let Err(e) = self.store.mark_running(job_id, started_at).await {
            warn!(job_id = %job_id, error = %e, "Failed to write running marker");
        }

        info!(
            job_id = %job_id,
            shots = record.config.shots,
            device = %record.config.device,
            "Processing job"
        );

        let result = self.run_isolated(record).await;
        self.finish(job_id, result).await.map(Some)
    }

    /// Input of a job that still needs running
    async fn load_pending(&self, job_id: &JobId) -> Result<Option<JobRecord>> {
        let Some(record) = self.store.load_input(job_id).await? else {
            warn!(job_id = %job_id, "Dequeued job has no stored input, skipping");
            return Ok(None);
        };
        if self.store.load_result(job_id).await?.is_some() {
            warn!(job_id = %job_id, "Dequeued job already has a result, skipping");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Persist the result and free the slot. A result the store keeps
    /// refusing stays readable from the slot.
    async fn finish(&self, job_id: &JobId, result: JobResult) -> Result<JobStatus> {
        let status = result.status();
        let record = ResultRecord::new(result, self.time_provider.now_millis());

        let persisted = self.persist_result(job_id, &record).await;
        if let Err(e) = &persisted {
            if !matches!(e, AppError::Conflict(_)) {
                error!(job_id = %job_id, error = %e, "Result not stored, holding it in memory");
                self.in_flight.hold_result(job_id, record);
            }
        }
        self.in_flight.clear();

        persisted.map(|()| status)
    }

    /// Retry writing results the store refused earlier
    async fn flush_held_results(&self) {
        for (job_id, record) in self.in_flight.held_results() {
            match self.store.put_result(&job_id, &record).await {
                Ok(()) | Err(AppError::Conflict(_)) => {
                    info!(job_id = %job_id, "Held result stored");
                    self.in_flight.release_result(&job_id);
                }
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Store still refuses held result");
                    return;
                }
            }
        }
    }

    /// Compile and execute in a separate task so a panic inside the runner
    /// becomes a FAILED job instead of a dead worker.
    async fn run_isolated(&self, record: JobRecord) -> JobResult {
        let runner = Arc::clone(&self.runner);
        let job_id = record.id.clone();

        let handle = tokio::task::spawn(async move {
            let native = runner
                .compile(&record.circuit, &record.config)
                .map_err(|e| e.to_string())?;
            runner.execute(&native).await.map_err(|e| e.to_string())
        });

        match handle.await {
            Ok(Ok(RunOutcome::Success(data))) => JobResult::Completed { data },
            Ok(Ok(RunOutcome::Crash(reason))) => {
                warn!(job_id = %job_id, reason = %reason, "Simulation crashed");
                JobResult::failed(reason)
            }
            Ok(Err(reason)) => {
                warn!(job_id = %job_id, reason = %reason, "Simulation could not run");
                JobResult::failed(reason)
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    error!(job_id = %job_id, "Simulation task panicked: {:?}", join_err);
                    JobResult::failed("simulation runner panicked")
                } else {
                    error!(job_id = %job_id, "Simulation task cancelled: {:?}", join_err);
                    JobResult::failed("simulation runner was cancelled")
                }
            }
        }
    }

    /// Write the terminal result, retrying transient store errors with a
    /// growing delay. A conflict is final.
    async fn persist_result(&self, job_id: &JobId, record: &ResultRecord) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.store.put_result(job_id, record).await {
                Ok(()) => return Ok(()),
                Err(e @ AppError::Conflict(_)) => return Err(e),
                Err(e) if attempt < RESULT_PERSIST_ATTEMPTS => {
                    warn!(
                        job_id = %job_id,
                        attempt = attempt,
                        error = %e,
                        "Failed to persist result, retrying"
                    );
                    sleep(RESULT_PERSIST_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
