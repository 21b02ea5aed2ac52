//! HTTP API Layer
//!
//! REST endpoints for submitting simulation jobs and polling their status.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `PUT`/`POST` | `/job` | submit a circuit |
//! | `GET` | `/job/{id}` | job status and result |
//! | `GET` | `/health` | liveness and queue depth |

pub mod error;
pub mod handler;
pub mod server;
pub mod state;
pub mod types;

pub use error::ApiError;
pub use server::{create_router, HttpServer, HttpServerConfig, HttpServerHandle};
pub use state::AppState;
