// Job Store Port (Interface)

use crate::domain::{JobId, JobRecord, ResultRecord};
use crate::error::Result;
use async_trait::async_trait;

/// A stored job that has no result yet (restart recovery input)
#[derive(Debug, Clone)]
pub struct UnfinishedJob {
    pub record: JobRecord,
    /// The worker had started this job when the process went away
    pub was_running: bool,
}

/// Durable mapping from job id to input, configuration and result.
///
/// Implementations must write results atomically: a reader sees either no
/// result or the complete one.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist payload and run configuration for a new job
    async fn put_input(&self, record: &JobRecord) -> Result<()>;

    /// Load a job's input, `None` for unknown ids
    async fn load_input(&self, id: &JobId) -> Result<Option<JobRecord>>;

    /// Record that the worker started the job
    async fn mark_running(&self, id: &JobId, started_at: i64) -> Result<()>;

    /// Persist the terminal result.
    ///
    /// # Errors
    /// - `AppError::Conflict` if a result already exists (terminal results are immutable)
    async fn put_result(&self, id: &JobId, result: &ResultRecord) -> Result<()>;

    /// Load a job's terminal result, `None` while it has none
    async fn load_result(&self, id: &JobId) -> Result<Option<ResultRecord>>;

    /// All jobs without a result, in submission order
    async fn list_unfinished(&self) -> Result<Vec<UnfinishedJob>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        inputs: HashMap<JobId, JobRecord>,
        running: HashSet<JobId>,
        results: HashMap<JobId, ResultRecord>,
    }

    /// In-memory JobStore for testing
    #[derive(Default)]
    pub struct MemoryJobStore {
        state: Mutex<State>,
        /// Writes still allowed before every write fails, `None` for unlimited
        writes_left: Mutex<Option<usize>>,
        fail_reads: Mutex<bool>,
    }

    impl MemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent write fail with a storage error
        pub fn set_fail_writes(&self, fail: bool) {
            *self.writes_left.lock().unwrap() = fail.then_some(0);
        }

        /// Let `count` more writes through, then fail every write
        pub fn fail_writes_after(&self, count: usize) {
            *self.writes_left.lock().unwrap() = Some(count);
        }

        /// Make every load fail with a storage error
        pub fn set_fail_reads(&self, fail: bool) {
            *self.fail_reads.lock().unwrap() = fail;
        }

        pub fn result_count(&self) -> usize {
            self.state.lock().unwrap().results.len()
        }

        pub fn input_count(&self) -> usize {
            self.state.lock().unwrap().inputs.len()
        }

        fn check_writable(&self) -> Result<()> {
            match self.writes_left.lock().unwrap().as_mut() {
                Some(0) => Err(AppError::Storage("mock store is read-only".to_string())),
                Some(left) => {
                    *left -= 1;
                    Ok(())
                }
                None => Ok(()),
            }
        }

        fn check_readable(&self) -> Result<()> {
            if *self.fail_reads.lock().unwrap() {
                return Err(AppError::Storage("mock store is unreadable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn put_input(&self, record: &JobRecord) -> Result<()> {
            self.check_writable()?;
            self.state
                .lock()
                .unwrap()
                .inputs
                .insert(record.id.clone(), record.clone());
            Ok(())
        }

        async fn load_input(&self, id: &JobId) -> Result<Option<JobRecord>> {
            self.check_readable()?;
            Ok(self.state.lock().unwrap().inputs.get(id).cloned())
        }

        async fn mark_running(&self, id: &JobId, _started_at: i64) -> Result<()> {
            self.check_writable()?;
            self.state.lock().unwrap().running.insert(id.clone());
            Ok(())
        }

        async fn put_result(&self, id: &JobId, result: &ResultRecord) -> Result<()> {
            self.check_writable()?;
            let mut state = self.state.lock().unwrap();
            if state.results.contains_key(id) {
                return Err(AppError::Conflict(format!("job {} already has a result", id)));
            }
            state.results.insert(id.clone(), result.clone());
            Ok(())
        }

        async fn load_result(&self, id: &JobId) -> Result<Option<ResultRecord>> {
            self.check_readable()?;
            Ok(self.state.lock().unwrap().results.get(id).cloned())
        }

        async fn list_unfinished(&self) -> Result<Vec<UnfinishedJob>> {
            let state = self.state.lock().unwrap();
            let mut jobs: Vec<UnfinishedJob> = state
                .inputs
                .values()
                .filter(|record| !state.results.contains_key(&record.id))
                .map(|record| UnfinishedJob {
                    record: record.clone(),
                    was_running: state.running.contains(&record.id),
                })
                .collect();
            jobs.sort_by_key(|job| job.record.submission_order());
            Ok(jobs)
        }
    }
}
