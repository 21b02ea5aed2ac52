// Subprocess simulation runner
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use qjob_core::application::worker::constants::{
    DEFAULT_SIMULATION_TIMEOUT, GRACEFUL_SHUTDOWN_TIMEOUT_MS,
};
use qjob_core::port::{ExecutionError, NativeConfig, RunOutcome, SimulationRunner, TimeProvider};

use crate::output::classify_output;

/// Environment variables the simulator inherits when no allowlist is given
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "TMPDIR",
    "LD_LIBRARY_PATH",
    "CUDA_VISIBLE_DEVICES",
    "OMP_NUM_THREADS",
];

/// How to launch the simulator
#[derive(Debug, Clone)]
pub struct SubprocessRunnerConfig {
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Execution deadline, `None` waits forever
    pub timeout: Option<Duration>,
    /// Time between SIGTERM and SIGKILL once the deadline has passed
    pub kill_grace: Duration,
    pub env_allowlist: Vec<String>,
}

impl SubprocessRunnerConfig {
    /// Defaults for everything but the executable: reads the native config
    /// from stdin (`-`), one hour deadline.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: vec!["-".to_string()],
            timeout: Some(DEFAULT_SIMULATION_TIMEOUT),
            kill_grace: Duration::from_millis(GRACEFUL_SHUTDOWN_TIMEOUT_MS),
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// A zero duration disables the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_env_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.env_allowlist = allowlist;
        self
    }
}

/// Runs the external simulator once per job.
/// The native config goes in on stdin, the result comes back on stdout.
pub struct SubprocessRunner {
    config: SubprocessRunnerConfig,
    time_provider: Arc<dyn TimeProvider>,
}

struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(
    ///     SubprocessRunnerConfig::new("qasm_simulator"),
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(config: SubprocessRunnerConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            config,
            time_provider,
        }
    }

    /// Keep only allowlisted variables
    fn filter_env<I>(&self, vars: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter(|(k, _)| self.config.env_allowlist.contains(k))
            .collect()
    }

    fn spawn(&self) -> Result<Child, ExecutionError> {
        let mut command = Command::new(&self.config.executable);
        command
            .args(&self.config.args)
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        command.spawn().map_err(|e| {
            ExecutionError::SpawnFailed(format!("{}: {}", self.config.executable.display(), e))
        })
    }

    /// Feed stdin, wait for exit and drain both output pipes, all within
    /// the deadline
    async fn run_to_exit(&self, input: Vec<u8>) -> Result<Finished, ExecutionError> {
        let mut child = self.spawn()?;
        // Process group id, equal to the simulator's pid
        let group = child.id();

        let stdin = child.stdin.take();
        let mut writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // A simulator that exits without reading closes the pipe early
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "Simulator stopped reading stdin");
                }
                let _ = stdin.shutdown().await;
            }
        });
        let mut stdout_reader = spawn_reader(child.stdout.take());
        let mut stderr_reader = spawn_reader(child.stderr.take());

        let run = async {
            let status = child
                .wait()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            // Helpers left behind in the group would keep the pipes open
            sweep_group(group);
            let _ = (&mut writer).await;
            let stdout = collect(&mut stdout_reader).await?;
            let stderr = collect(&mut stderr_reader).await?;
            Ok::<_, ExecutionError>(Finished {
                status,
                stdout,
                stderr,
            })
        };

        let Some(deadline) = self.config.timeout else {
            return run.await;
        };
        let outcome = timeout(deadline, run).await;
        match outcome {
            Ok(finished) => finished,
            Err(_) => {
                writer.abort();
                stdout_reader.abort();
                stderr_reader.abort();
                self.terminate(&mut child, group).await;
                Err(ExecutionError::Timeout(deadline.as_millis() as u64))
            }
        }
    }

    /// SIGTERM to the whole group first, SIGKILL once the grace period is over
    async fn terminate(&self, child: &mut Child, group: Option<u32>) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pgid) = group {
                let pgid = Pid::from_raw(pgid as i32);
                info!(pgid = %pgid, "Sending SIGTERM to simulator process group");
                if let Err(e) = killpg(pgid, Signal::SIGTERM) {
                    warn!(pgid = %pgid, error = %e, "SIGTERM failed");
                }

                if timeout(self.config.kill_grace, child.wait()).await.is_ok() {
                    info!(pgid = %pgid, "Simulator exited after SIGTERM");
                } else {
                    warn!(pgid = %pgid, "Simulator did not exit after SIGTERM, sending SIGKILL");
                }
                if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                    debug!(pgid = %pgid, error = %e, "SIGKILL found no process left");
                }
                let _ = child.wait().await;
                return;
            }
        }

        #[cfg(not(unix))]
        let _ = group;
        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill simulator");
        }
    }
}

/// Kill whatever is left in the simulator's process group after it exited
#[cfg(unix)]
fn sweep_group(group: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pgid) = group {
        if killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL).is_ok() {
            debug!(pgid = %pgid, "Killed processes left behind by the simulator");
        }
    }
}

#[cfg(not(unix))]
fn sweep_group(_group: Option<u32>) {}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn collect(
    reader: &mut JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, ExecutionError> {
    reader
        .await
        .map_err(|e| ExecutionError::IoError(e.to_string()))?
        .map_err(|e| ExecutionError::IoError(e.to_string()))
}

#[async_trait]
impl SimulationRunner for SubprocessRunner {
    async fn execute(&self, native: &NativeConfig) -> Result<RunOutcome, ExecutionError> {
        let input =
            serde_json::to_vec(native).map_err(|e| ExecutionError::InvalidConfig(e.to_string()))?;
        let start_time = self.time_provider.now_millis();

        info!(
            executable = %self.config.executable.display(),
            n_qubits = native.n_qubits,
            shots = native.config.shots,
            timeout_ms = ?self.config.timeout.map(|t| t.as_millis()),
            "Starting simulator"
        );

        let finished = self.run_to_exit(input).await?;
        let duration_ms = self.time_provider.now_millis() - start_time;
        let outcome = classify_output(finished.status.code(), &finished.stdout, &finished.stderr);

        info!(
            duration_ms = %duration_ms,
            exit_code = ?finished.status.code(),
            success = matches!(outcome, RunOutcome::Success(_)),
            "Simulator finished"
        );

        Ok(outcome)
    }
}
