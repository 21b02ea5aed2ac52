//! Simple SDK Example
//!
//! Demonstrates basic usage of the QJob SDK.
//!
//! # Usage
//!
//! 1. Start the server:
//!    ```bash
//!    cargo run --package qjob-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use qjob_sdk::{QJobClient, SubmitRequest};
use std::time::Duration;

const BELL: &str = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q -> c;
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("QJob SDK - Simple Example");
    println!("=========================\n");

    // 1. Connect to server
    println!("1. Connecting to server...");
    let client = QJobClient::connect("http://127.0.0.1:8080").await?;
    let health = client.health().await?;
    println!("   ✓ Connected (v{}, {} queued)\n", health.version, health.queue_size);

    // 2. Submit a Bell circuit
    println!("2. Submitting a job...");
    let response = client
        .submit(&SubmitRequest::new(BELL).shots(100).device("CPU"))
        .await?;
    let Some(job_id) = response.job_id.clone().filter(|_| response.is_submitted()) else {
        println!("   ⚠ Submission not accepted: {:?}", response.reason);
        return Ok(());
    };
    println!("   ✓ Job submitted:");
    println!("     - ID: {}", job_id);
    println!("     - Status: {}\n", response.status);

    // 3. Wait for the result
    println!("3. Waiting for the simulation...");
    let done = client
        .wait_for_terminal(&job_id, Duration::from_millis(500), Duration::from_secs(120))
        .await?;
    println!("   ✓ Finished as {}\n", done.status);

    // 4. Show the result
    match (&done.data, &done.reason) {
        (Some(data), _) => println!("{}", serde_json::to_string_pretty(data)?),
        (None, Some(reason)) => println!("Reason: {}", reason),
        (None, None) => {}
    }

    Ok(())
}
