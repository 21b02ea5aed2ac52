//! QJob SDK - Rust Client Library
//!
//! Provides a convenient client for submitting circuits to a QJob server and
//! collecting their results.
//!
//! # Example
//!
//! ```no_run
//! use qjob_sdk::{QJobClient, SubmitRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to server
//!     let client = QJobClient::connect("http://127.0.0.1:8080").await?;
//!
//!     // Submit a Bell circuit
//!     let qasm = "OPENQASM 2.0; qreg q[2]; creg c[2]; h q[0]; cx q[0],q[1]; measure q -> c;";
//!     let response = client.submit(&SubmitRequest::new(qasm).shots(100)).await?;
//!     let job_id = response.job_id.ok_or("submission ignored")?;
//!
//!     // Poll until it finishes
//!     let done = client
//!         .wait_for_terminal(&job_id, Duration::from_millis(500), Duration::from_secs(60))
//!         .await?;
//!     println!("{} finished as {}", job_id, done.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::QJobClient;
pub use error::{Result, SdkError};
pub use types::{HealthResponse, StatusResponse, SubmitRequest, SubmitResponse};
