// Restart recovery
use crate::application::queue::WorkQueue;
use crate::application::worker::constants::INTERRUPTED_REASON;
use crate::domain::{JobResult, ResultRecord};
use crate::port::{JobStore, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// What a recovery pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub requeued: usize,
    pub interrupted: usize,
}

/// Restart recovery service
///
/// On daemon startup, before the worker runs, brings every stored job without
/// a result back under management.
pub struct RecoveryService {
    store: Arc<dyn JobStore>,
    queue: Arc<WorkQueue>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RecoveryService {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<WorkQueue>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            queue,
            time_provider,
        }
    }

    /// Recover unfinished jobs
    ///
    /// Algorithm:
    /// 1. List jobs without a result in `(created_at, sequence)` order
    /// 2. Jobs with a running marker were cut off mid-simulation: record FAILED
    /// 3. All others are re-enqueued in order
    pub async fn recover(&self) -> crate::error::Result<RecoveryReport> {
        let unfinished = self.store.list_unfinished().await?;
        info!(count = unfinished.len(), "Starting restart recovery");

        let mut report = RecoveryReport::default();
        for job in unfinished {
            let id = job.record.id;
            if job.was_running {
                warn!(job_id = %id, "Job was running at shutdown, marking as FAILED");
                let result = ResultRecord::new(
                    JobResult::failed(INTERRUPTED_REASON),
                    self.time_provider.now_millis(),
                );
                self.store.put_result(&id, &result).await?;
                report.interrupted += 1;
            } else {
                self.queue.enqueue(id);
                report.requeued += 1;
            }
        }

        info!(
            requeued = report.requeued,
            interrupted = report.interrupted,
            "Restart recovery complete"
        );
        Ok(report)
    }
}
