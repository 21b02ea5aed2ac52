// In-flight slot - id of the job the worker is currently running, plus
// terminal results the store has not accepted yet

use crate::domain::{JobId, ResultRecord};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Worker-owned state read by status queries.
///
/// Written only by the worker. A result is held here when the store refused
/// it, so the job still reads as terminal until a later write succeeds.
#[derive(Default)]
pub struct InFlightSlot {
    current: Mutex<Option<JobId>>,
    held: Mutex<BTreeMap<JobId, ResultRecord>>,
}

impl InFlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: &JobId) {
        *lock(&self.current) = Some(id.clone());
    }

    pub fn clear(&self) {
        *lock(&self.current) = None;
    }

    pub fn current(&self) -> Option<JobId> {
        lock(&self.current).clone()
    }

    pub fn is_running(&self, id: &str) -> bool {
        lock(&self.current).as_deref() == Some(id)
    }

    /// Keep a terminal result in memory until the store takes it
    pub fn hold_result(&self, id: &JobId, record: ResultRecord) {
        lock(&self.held).insert(id.clone(), record);
    }

    pub fn held_result(&self, id: &str) -> Option<ResultRecord> {
        lock(&self.held).get(id).cloned()
    }

    /// Snapshot of every held result, oldest id first
    pub fn held_results(&self) -> Vec<(JobId, ResultRecord)> {
        lock(&self.held)
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Drop a held result once it is durable
    pub fn release_result(&self, id: &str) {
        lock(&self.held).remove(id);
    }
}

fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
