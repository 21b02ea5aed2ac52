//! Domain model, ports and application services for the simulation job
//! server. Adapters (file store, subprocess runner, HTTP) live in their own
//! crates and plug in through the traits in [`port`].

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
