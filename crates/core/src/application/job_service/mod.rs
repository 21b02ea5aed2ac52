// Job Service - Submission and status use cases

pub mod status;
pub mod submit;

#[cfg(test)]
mod submit_test;

pub use status::JobView;
pub use submit::{SubmitOutcome, SubmitRequest};

use crate::application::queue::WorkQueue;
use crate::application::worker::InFlightSlot;
use crate::domain::RunConfigDefaults;
use crate::error::Result;
use crate::port::{IdProvider, JobStore, SimulationRunner, TimeProvider};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Entry point for everything the HTTP layer does with jobs.
///
/// Handlers never run simulations: submission persists and enqueues, status
/// only reads.
pub struct JobService {
    store: Arc<dyn JobStore>,
    queue: Arc<WorkQueue>,
    runner: Arc<dyn SimulationRunner>,
    in_flight: Arc<InFlightSlot>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    defaults: RunConfigDefaults,
    sequence: AtomicU64,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<WorkQueue>,
        runner: Arc<dyn SimulationRunner>,
        in_flight: Arc<InFlightSlot>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        defaults: RunConfigDefaults,
    ) -> Self {
        Self {
            store,
            queue,
            runner,
            in_flight,
            id_provider,
            time_provider,
            defaults,
            sequence: AtomicU64::new(0),
        }
    }

    /// Accept a submission
    pub async fn submit(&self, req: SubmitRequest) -> Result<SubmitOutcome> {
        submit::execute(
            submit::Context {
                store: self.store.as_ref(),
                queue: &self.queue,
                runner: self.runner.as_ref(),
                id_provider: self.id_provider.as_ref(),
                time_provider: self.time_provider.as_ref(),
                defaults: &self.defaults,
                sequence: &self.sequence,
            },
            req,
        )
        .await
    }

    /// Current state of a job, `None` for unknown ids
    pub async fn status(&self, id: &str) -> Result<Option<JobView>> {
        status::execute(self.store.as_ref(), &self.queue, &self.in_flight, id).await
    }

    /// Pending count snapshot
    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }
}
