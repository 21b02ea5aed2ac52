// Worker constants (No magic values)
use std::time::Duration;

/// Sleep duration after a store error before touching the next job (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Attempts at writing a terminal result before giving up on a job
pub const RESULT_PERSIST_ATTEMPTS: u32 = 3;

/// Base delay between result write attempts, grows with each attempt (200ms)
pub const RESULT_PERSIST_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Graceful process shutdown timeout after SIGTERM (5 seconds)
/// Used by SubprocessRunner when a simulation exceeds its deadline
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Default simulation deadline (1 hour)
pub const DEFAULT_SIMULATION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Reason recorded for jobs that were running when the server went down
pub const INTERRUPTED_REASON: &str = "interrupted: server restarted while job was running";

/// Reason prefix for jobs the worker could not load from the store
pub const STORE_UNAVAILABLE_REASON: &str = "job store unavailable";
