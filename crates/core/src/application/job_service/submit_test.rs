//! Unit tests for submission and status resolution

use super::*;
use crate::domain::{JobResult, JobStatus, ResultRecord};
use crate::port::id_provider::SequentialIdProvider;
use crate::port::job_store::mocks::MemoryJobStore;
use crate::port::simulation_runner::mocks::MockSimulationRunner;
use crate::port::time_provider::FixedTimeProvider;
use crate::AppError;
use serde_json::json;

const BELL: &str = "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;\n";

struct Fixture {
    store: Arc<MemoryJobStore>,
    queue: Arc<WorkQueue>,
    slot: Arc<InFlightSlot>,
    service: JobService,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(WorkQueue::new());
    let slot = Arc::new(InFlightSlot::new());
    let service = JobService::new(
        store.clone(),
        queue.clone(),
        MockSimulationRunner::new_success().shared(),
        slot.clone(),
        Arc::new(SequentialIdProvider::default()),
        Arc::new(FixedTimeProvider::new(1_700_000_000_000)),
        RunConfigDefaults::default(),
    );
    Fixture {
        store,
        queue,
        slot,
        service,
    }
}

fn request(body: serde_json::Value) -> SubmitRequest {
    SubmitRequest::from_body(body).unwrap()
}

#[test]
fn test_from_body_accepts_qasm_alias() {
    let req = request(json!({"qasm": BELL, "shots": 10}));
    assert_eq!(req.circuit.as_deref(), Some(BELL));
    assert_eq!(req.options.get("shots"), Some(&json!(10)));
    assert!(!req.options.contains_key("qasm"));
}

#[test]
fn test_from_body_non_string_circuit_is_missing() {
    let req = request(json!({"circuit": 42}));
    assert!(req.circuit.is_none());
}

#[test]
fn test_from_body_rejects_non_object() {
    let err = SubmitRequest::from_body(json!([1, 2])).unwrap_err();
    assert!(err.contains("JSON object"));
}

#[tokio::test]
async fn test_submit_persists_and_enqueues() {
    let f = fixture();

    let outcome = f
        .service
        .submit(request(json!({"circuit": BELL, "shots": 100})))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Submitted {
            job_id: "job-1".to_string()
        }
    );
    assert_eq!(f.queue.size(), 1);
    let record = f.store.load_input(&"job-1".to_string()).await.unwrap().unwrap();
    assert_eq!(record.circuit, BELL);
    assert_eq!(record.config.shots, 100);
    assert_eq!(record.config.blocking_unit, 23);
}

#[tokio::test]
async fn test_missing_circuit_creates_nothing() {
    let f = fixture();

    let outcome = f.service.submit(request(json!({"shots": 100}))).await.unwrap();

    match outcome {
        SubmitOutcome::Ignored { job_id, reason } => {
            assert!(job_id.is_none());
            assert!(reason.contains("circuit"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(f.store.input_count(), 0);
    assert_eq!(f.queue.size(), 0);
}

#[tokio::test]
async fn test_malformed_config_rejected_without_id() {
    let f = fixture();

    for options in [
        json!({"circuit": BELL, "shots": "many"}),
        json!({"circuit": BELL, "shots": 0}),
        json!({"circuit": BELL, "device": "TPU"}),
    ] {
        let outcome = f.service.submit(request(options)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    }
    assert_eq!(f.store.input_count(), 0);
    assert_eq!(f.queue.size(), 0);
}

#[tokio::test]
async fn test_invalid_circuit_recorded_as_ignored() {
    let f = fixture();

    let outcome = f
        .service
        .submit(request(json!({"circuit": "qreg q[2]; h q[0];"})))
        .await
        .unwrap();

    let job_id = match outcome {
        SubmitOutcome::Ignored {
            job_id: Some(id), ..
        } => id,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(f.queue.size(), 0);

    let view = f.service.status(&job_id).await.unwrap().unwrap();
    assert_eq!(view.status, JobStatus::Ignored);
    assert!(view.reason.unwrap().contains("OPENQASM"));
}

#[tokio::test]
async fn test_storage_failure_not_queued() {
    let f = fixture();
    f.store.set_fail_writes(true);

    let err = f
        .service
        .submit(request(json!({"circuit": BELL})))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(f.queue.size(), 0);
}

#[tokio::test]
async fn test_ids_are_unique() {
    let f = fixture();
    let mut ids = std::collections::HashSet::new();
    for _ in 0..10 {
        if let SubmitOutcome::Submitted { job_id } =
            f.service.submit(request(json!({"circuit": BELL}))).await.unwrap()
        {
            ids.insert(job_id);
        }
    }
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_status_progression() {
    let f = fixture();
    f.service
        .submit(request(json!({"circuit": BELL, "shots": 10})))
        .await
        .unwrap();
    let id = "job-1".to_string();

    let pending = f.service.status(&id).await.unwrap().unwrap();
    assert_eq!(pending.status, JobStatus::PendingInQueue);
    assert_eq!(pending.queue_size, Some(1));

    f.queue.try_dequeue();
    f.slot.set(&id);
    let running = f.service.status(&id).await.unwrap().unwrap();
    assert_eq!(running.status, JobStatus::Running);
    assert!(running.queue_size.is_none());

    let result = ResultRecord::new(JobResult::Completed { data: json!({"counts": {"0x0": 10}}) }, 5);
    f.store.put_result(&id, &result).await.unwrap();
    // Result wins even while the slot still names the job
    let done = f.service.status(&id).await.unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.data, Some(json!({"counts": {"0x0": 10}})));
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let f = fixture();
    assert!(f.service.status("no-such-job").await.unwrap().is_none());
    assert!(f.service.status("../etc/passwd").await.unwrap().is_none());
    assert!(f.service.status("").await.unwrap().is_none());
    // Polling is idempotent
    assert!(f.service.status("no-such-job").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ignored_job_stays_terminal_when_input_write_fails() {
    let f = fixture();
    // The IGNORED result goes through, the input write after it fails
    f.store.fail_writes_after(1);

    let err = f
        .service
        .submit(request(json!({"circuit": "qreg q[2]; h q[0];"})))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(f.queue.size(), 0);
    let view = f.service.status("job-1").await.unwrap().unwrap();
    assert_eq!(view.status, JobStatus::Ignored);
    assert!(f.store.list_unfinished().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_terminal_after_result_write_failure() {
    let f = fixture();
    let worker = crate::application::Worker::new(
        f.queue.clone(),
        f.store.clone(),
        MockSimulationRunner::new_success().shared(),
        f.slot.clone(),
        Arc::new(FixedTimeProvider::new(1_700_000_000_500)),
    );
    f.service
        .submit(request(json!({"circuit": BELL, "shots": 10})))
        .await
        .unwrap();
    let id = f.queue.dequeue().await;

    f.store.set_fail_writes(true);
    assert!(worker.process_job(&id).await.is_err());
    f.store.set_fail_writes(false);

    let view = f.service.status(&id).await.unwrap().unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert!(view.queue_size.is_none());
    assert_eq!(f.store.result_count(), 0);

    // The next job the worker touches flushes the held result
    assert_eq!(worker.process_job(&"ghost".to_string()).await.unwrap(), None);
    assert_eq!(f.store.result_count(), 1);
    assert!(f.slot.held_result(&id).is_none());
    let view = f.service.status(&id).await.unwrap().unwrap();
    assert_eq!(view.status, JobStatus::Completed);
}
