//! QJob Simulation Job Server - Main Entry Point

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

// Import workspace crates
use qjob_api_http::{HttpServer, HttpServerConfig};
use qjob_core::application::{InFlightSlot, JobService, RecoveryService, WorkQueue, Worker};
use qjob_core::port::id_provider::UuidProvider;
use qjob_core::port::time_provider::SystemTimeProvider;
use qjob_core::port::{JobStore, SimulationRunner, TimeProvider};
use qjob_infra_fs::FsJobStore;
use qjob_infra_system::{SubprocessRunner, SubprocessRunnerConfig};

use config::DaemonConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (before logging: it picks the log format)
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    logging::init_logging(config.log_format).context("Failed to initialize logging")?;

    info!("QJob simulation server v{} starting...", qjob_core::VERSION);
    info!(
        data_dir = %config.data_dir.display(),
        simulator = %config.simulator.display(),
        sim_timeout_secs = config.sim_timeout.as_secs(),
        "Configuration loaded"
    );

    // 3. Open the job store
    let store: Arc<dyn JobStore> = Arc::new(
        FsJobStore::open(&config.data_dir)
            .await
            .context("Failed to open data directory")?,
    );

    // 4. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let queue = Arc::new(WorkQueue::new());
    let in_flight = Arc::new(InFlightSlot::new());
    let runner: Arc<dyn SimulationRunner> = Arc::new(SubprocessRunner::new(
        SubprocessRunnerConfig::new(config.simulator.clone())
            .with_args(config.simulator_args.clone())
            .with_timeout(config.sim_timeout),
        time_provider.clone(),
    ));

    // 5. Restart recovery (before the worker takes anything off the queue)
    info!("Running restart recovery...");
    let recovery = RecoveryService::new(store.clone(), queue.clone(), time_provider.clone());
    let report = recovery.recover().await.context("Restart recovery failed")?;
    info!(
        requeued = report.requeued,
        interrupted = report.interrupted,
        "Restart recovery completed"
    );

    // 6. Start Worker (job processing loop)
    info!("Starting worker...");
    let worker = Worker::new(
        queue.clone(),
        store.clone(),
        runner.clone(),
        in_flight.clone(),
        time_provider.clone(),
    );
    let worker_handle = tokio::spawn(async move { worker.run().await });

    // 7. Start HTTP server
    let jobs = Arc::new(JobService::new(
        store,
        queue,
        runner,
        in_flight,
        Arc::new(UuidProvider),
        time_provider,
        config.defaults.clone(),
    ));
    let http_config = HttpServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
    };
    let http_handle = HttpServer::new(http_config, jobs)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server start failed: {}", e))?;

    info!(addr = %http_handle.local_addr(), "System ready. Waiting for jobs...");
    info!("Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received. Exiting...");
        }
        joined = worker_handle => {
            error!(result = ?joined, "Worker stopped unexpectedly");
        }
    }

    // Queued jobs stay on disk and are picked up by the next start
    http_handle.stop().await;
    info!("Shutdown complete.");

    Ok(())
}
