//! Router tests for the QJob HTTP API.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use qjob_api_http::{create_router, AppState};
use qjob_core::application::{InFlightSlot, JobService, WorkQueue, Worker};
use qjob_core::domain::RunConfigDefaults;
use qjob_core::port::id_provider::SequentialIdProvider;
use qjob_core::port::job_store::mocks::MemoryJobStore;
use qjob_core::port::simulation_runner::mocks::MockSimulationRunner;
use qjob_core::port::time_provider::FixedTimeProvider;
use serde_json::{json, Value};

// ============================================================================
// Test helpers
// ============================================================================

const BELL_QASM: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;\n";

struct Harness {
    server: TestServer,
    store: Arc<MemoryJobStore>,
    queue: Arc<WorkQueue>,
    worker: Worker,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(WorkQueue::new());
    let runner = MockSimulationRunner::new_success().shared();
    let slot = Arc::new(InFlightSlot::new());
    let time = Arc::new(FixedTimeProvider::new(1_000));

    let jobs = Arc::new(JobService::new(
        store.clone(),
        queue.clone(),
        runner.clone(),
        slot.clone(),
        Arc::new(SequentialIdProvider::default()),
        time.clone(),
        RunConfigDefaults::default(),
    ));
    let worker = Worker::new(queue.clone(), store.clone(), runner, slot, time);

    let router = create_router(Arc::new(AppState::new(jobs)));
    Harness {
        server: TestServer::new(router).expect("test server"),
        store,
        queue,
        worker,
    }
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_put_job_accepted() {
    let h = harness();

    let response = h
        .server
        .put("/job")
        .json(&json!({ "circuit": BELL_QASM, "shots": 100 }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "SUBMITTED");
    assert_eq!(body["job-id"], "job-1");
    assert_eq!(h.queue.size(), 1);
}

#[tokio::test]
async fn test_post_is_an_alias_and_qasm_field_accepted() {
    let h = harness();

    let response = h
        .server
        .post("/job")
        .json(&json!({ "qasm": BELL_QASM }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "SUBMITTED");
}

#[tokio::test]
async fn test_missing_circuit_is_ignored_without_job() {
    let h = harness();

    let response = h.server.put("/job").json(&json!({ "shots": 100 })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "IGNORED");
    assert!(body.get("job-id").is_none());
    assert_eq!(h.store.input_count(), 0);
    assert_eq!(h.queue.size(), 0);
}

#[tokio::test]
async fn test_unparseable_bodies_are_ignored() {
    let h = harness();

    let response = h.server.put("/job").text("{not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["status"], "IGNORED");

    let response = h.server.put("/job").json(&json!(["circuit"])).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["status"], "IGNORED");

    assert_eq!(h.store.input_count(), 0);
}

#[tokio::test]
async fn test_malformed_config_fails_without_job() {
    let h = harness();

    let response = h
        .server
        .put("/job")
        .json(&json!({ "circuit": BELL_QASM, "shots": "lots" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "FAILED");
    assert!(body["reason"].as_str().unwrap().contains("shots"));
    assert!(body.get("job-id").is_none());
    assert_eq!(h.store.input_count(), 0);
}

#[tokio::test]
async fn test_invalid_circuit_recorded_as_ignored() {
    let h = harness();

    let response = h
        .server
        .put("/job")
        .json(&json!({ "circuit": "OPENQASM 2.0; h q[0];" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "IGNORED");
    let id = body["job-id"].as_str().unwrap().to_string();
    assert_eq!(h.queue.size(), 0);

    let status: Value = h.server.get(&format!("/job/{}", id)).await.json();
    assert_eq!(status["status"], "IGNORED");
    assert!(status["reason"].as_str().unwrap().contains("no qubits"));
}

#[tokio::test]
async fn test_storage_failure_returns_500() {
    let h = harness();
    h.store.set_fail_writes(true);

    let response = h
        .server
        .put("/job")
        .json(&json!({ "circuit": BELL_QASM }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], "FAILED");
    assert!(body["reason"].as_str().is_some());
    assert_eq!(h.queue.size(), 0);
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_pending_then_completed() {
    let h = harness();
    h.server
        .put("/job")
        .json(&json!({ "circuit": BELL_QASM, "shots": 100 }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let response = h.server.get("/job/job-1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "PENDING_IN_QUEUE");
    assert_eq!(body["queue-size"], 1);
    assert!(body.get("data").is_none());

    let id = h.queue.try_dequeue().unwrap();
    h.worker.process_job(&id).await.unwrap();

    let body: Value = h.server.get("/job/job-1").await.json();
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["job-id"], "job-1");
    let counts = &body["data"]["results"][0]["data"]["counts"];
    assert_eq!(
        counts["0x0"].as_u64().unwrap() + counts["0x3"].as_u64().unwrap(),
        100
    );
    assert!(body.get("queue-size").is_none());
}

#[tokio::test]
async fn test_unknown_job_is_404_every_time() {
    let h = harness();

    for _ in 0..3 {
        let response = h.server.get("/job/does-not-exist").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
    }

    h.server
        .get("/job/..%2F..%2Fetc%2Fpasswd")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_queue_size() {
    let h = harness();
    h.server
        .post("/job")
        .json(&json!({ "circuit": BELL_QASM }))
        .await;

    let response = h.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
    assert_eq!(body["queue_size"], 1);
}
