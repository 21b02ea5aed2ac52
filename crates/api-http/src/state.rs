//! Shared state handed to every handler.

use qjob_core::application::JobService;
use std::sync::Arc;

pub struct AppState {
    pub jobs: Arc<JobService>,
}

impl AppState {
    pub fn new(jobs: Arc<JobService>) -> Self {
        Self { jobs }
    }
}
