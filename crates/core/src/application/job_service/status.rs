// Status Use Case

use crate::application::queue::WorkQueue;
use crate::application::worker::InFlightSlot;
use crate::domain::{is_valid_job_id, JobId, JobStatus};
use crate::error::Result;
use crate::port::JobStore;

/// Point-in-time view of one job
#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    pub id: JobId,
    pub status: JobStatus,
    /// Simulator output, COMPLETED only
    pub data: Option<serde_json::Value>,
    /// FAILED and IGNORED only
    pub reason: Option<String>,
    /// PENDING_IN_QUEUE only
    pub queue_size: Option<usize>,
}

impl JobView {
    fn bare(id: &str, status: JobStatus) -> Self {
        Self {
            id: id.to_string(),
            status,
            data: None,
            reason: None,
            queue_size: None,
        }
    }
}

/// Resolve a job's status from storage and the in-flight slot.
///
/// Precedence: held or stored result, then in-flight slot, then stored
/// input. The slot is sampled before the results are read, so a job
/// finishing concurrently is reported RUNNING or terminal, never PENDING
/// again.
pub(super) async fn execute(
    store: &dyn JobStore,
    queue: &WorkQueue,
    in_flight: &InFlightSlot,
    id: &str,
) -> Result<Option<JobView>> {
    if !is_valid_job_id(id) {
        return Ok(None);
    }
    let id_owned: JobId = id.to_string();

    let running = in_flight.is_running(id);

    let result = match in_flight.held_result(id) {
        Some(record) => Some(record),
        None => store.load_result(&id_owned).await?,
    };
    if let Some(record) = result {
        let mut view = JobView::bare(id, record.result.status());
        view.data = record.result.data().cloned();
        view.reason = record.result.reason().map(str::to_string);
        return Ok(Some(view));
    }

    if running {
        return Ok(Some(JobView::bare(id, JobStatus::Running)));
    }

    if store.load_input(&id_owned).await?.is_some() {
        let mut view = JobView::bare(id, JobStatus::PendingInQueue);
        view.queue_size = Some(queue.size());
        return Ok(Some(view));
    }

    Ok(None)
}
