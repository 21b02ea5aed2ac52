//! End-to-end job lifecycle against the file store and a subprocess simulator
//!
//! - At most one job RUNNING at any time
//! - Strict submission order
//! - Crash isolation
//! - Terminal results are immutable
//! - Unknown ids and missing circuits

#![cfg(unix)]

mod common;

use common::*;
use qjob_core::application::{SubmitOutcome, SubmitRequest};
use qjob_core::domain::{JobResult, JobStatus, ResultRecord};
use qjob_core::error::AppError;
use qjob_core::port::JobStore;
use std::time::Duration;

fn lifecycle_rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Submitted => 0,
        JobStatus::PendingInQueue => 1,
        JobStatus::Running => 2,
        JobStatus::Completed | JobStatus::Failed | JobStatus::Ignored => 3,
    }
}

#[tokio::test]
async fn test_two_bell_jobs_complete_one_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    let first = system.submit(BELL_QASM, 100).await;
    let second = system.submit(BELL_QASM, 100).await;
    assert_ne!(first, second);

    // Poll both until done; never two RUNNING at once
    let mut history_first = Vec::new();
    let mut history_second = Vec::new();
    for _ in 0..500 {
        let a = system.status(&first).await;
        let b = system.status(&second).await;
        assert!(
            !(a.status == JobStatus::Running && b.status == JobStatus::Running),
            "two jobs running at once"
        );
        if history_first.last() != Some(&a.status) {
            history_first.push(a.status);
        }
        if history_second.last() != Some(&b.status) {
            history_second.push(b.status);
        }
        if a.status.is_terminal() && b.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for (id, history) in [(&first, &history_first), (&second, &history_second)] {
        assert_eq!(history.last(), Some(&JobStatus::Completed), "{} {:?}", id, history);
        let ranks: Vec<u8> = history.iter().map(|s| lifecycle_rank(*s)).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]), "{} went {:?}", id, history);
        let view = system.status(id).await;
        assert_eq!(total_counts(view.data.as_ref().unwrap()), 100);
    }
}

#[tokio::test]
async fn test_crash_fails_job_and_worker_continues() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    let crashing = system.submit(CRASHING_QASM, 10).await;
    let healthy = system.submit(BELL_QASM, 10).await;

    let (failed, _) = system.wait_terminal(&crashing).await;
    assert_eq!(failed.status, JobStatus::Failed);
    let reason = failed.reason.unwrap();
    assert!(reason.contains("139"), "{}", reason);
    assert!(reason.contains("simulated segfault"), "{}", reason);

    let (done, _) = system.wait_terminal(&healthy).await;
    assert_eq!(done.status, JobStatus::Completed);

    // Polling a failed job keeps returning FAILED with its reason
    for _ in 0..3 {
        let again = system.status(&crashing).await;
        assert_eq!(again.status, JobStatus::Failed);
        assert!(again.reason.is_some());
    }
}

#[tokio::test]
async fn test_jobs_run_in_submission_order() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    let circuits: Vec<String> = (1..=4)
        .map(|n| format!("OPENQASM 2.0;\nqreg q[{}];\nh q[0];\n", n))
        .collect();
    let mut ids = Vec::new();
    for circuit in &circuits {
        ids.push(system.submit(circuit, 8).await);
    }
    for id in &ids {
        system.wait_terminal(id).await;
    }

    assert_eq!(system.runner.executed(), circuits);
}

#[tokio::test]
async fn test_terminal_result_is_immutable() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    let id = system.submit(BELL_QASM, 20).await;
    let (done, _) = system.wait_terminal(&id).await;
    assert_eq!(done.status, JobStatus::Completed);

    let overwrite = ResultRecord::new(JobResult::failed("late writer"), 0);
    let err = system.store.put_result(&id, &overwrite).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let after = system.status(&id).await;
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.data, done.data);
}

#[tokio::test]
async fn test_unknown_id_polling_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    for _ in 0..5 {
        assert!(system.jobs.status("no-such-job").await.unwrap().is_none());
    }
    assert!(!store_has_result(&system.store, "no-such-job").await);
}

#[tokio::test]
async fn test_missing_circuit_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let system = start_system(dir.path()).await;

    let request = SubmitRequest::from_body(serde_json::json!({ "shots": 100 })).unwrap();
    let outcome = system.jobs.submit(request).await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Ignored { job_id: None, .. }));
    assert_eq!(system.queue.size(), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_simulation_timeout_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let system =
        start_system_with(dir.path(), "cat > /dev/null; exec sleep 10", Duration::from_millis(300))
            .await;

    let slow = system.submit(BELL_QASM, 10).await;
    let (view, history) = system.wait_terminal(&slow).await;

    assert_eq!(view.status, JobStatus::Failed);
    let reason = view.reason.unwrap();
    assert!(reason.to_lowercase().contains("timeout"), "{}", reason);
    assert_eq!(history.last(), Some(&JobStatus::Failed));
}
