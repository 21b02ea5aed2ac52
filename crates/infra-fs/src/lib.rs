// QJob Infrastructure - Filesystem Adapter
// Implements: JobStore

mod atomic_write;
mod fs_job_store;

pub use atomic_write::{write_atomic, write_new_atomic};
pub use fs_job_store::FsJobStore;
