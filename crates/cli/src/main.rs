//! QJob CLI - Command-line interface for the QJob simulation job server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use qjob_sdk::{QJobClient, SdkError, StatusResponse, SubmitRequest};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "qjob")]
#[command(about = "QJob simulation job server CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL
    #[arg(long, env = "QJOB_URL", default_value = DEFAULT_SERVER_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an OpenQASM circuit
    Submit {
        /// Circuit file (OpenQASM 2 or 3)
        file: PathBuf,

        /// Number of shots
        #[arg(short, long)]
        shots: Option<u64>,

        /// CPU or GPU
        #[arg(short, long)]
        device: Option<String>,

        /// single or double
        #[arg(short, long)]
        precision: Option<String>,

        /// Noise model JSON file
        #[arg(long)]
        noise_model: Option<PathBuf>,

        /// Wait for the job to finish and print its result
        #[arg(short, long)]
        wait: bool,
    },

    /// Show a job's status
    Status {
        /// Job ID
        job_id: String,
    },

    /// Wait for a job to finish
    Wait {
        /// Job ID
        job_id: String,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Give up after this many seconds
        #[arg(long, default_value = "3600")]
        timeout_secs: u64,
    },
}

#[derive(Tabled)]
struct JobRow {
    job_id: String,
    status: String,
    detail: String,
}

impl From<&StatusResponse> for JobRow {
    fn from(status: &StatusResponse) -> Self {
        let detail = match (&status.reason, status.queue_size) {
            (Some(reason), _) => reason.clone(),
            (None, Some(queued)) => format!("{} queued", queued),
            (None, None) => String::new(),
        };
        Self {
            job_id: status.job_id.clone(),
            status: status.status.clone(),
            detail,
        }
    }
}

fn build_request(
    file: &Path,
    shots: Option<u64>,
    device: Option<String>,
    precision: Option<String>,
    noise_model: Option<&Path>,
) -> Result<SubmitRequest> {
    let circuit = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read circuit file {}", file.display()))?;

    let mut request = SubmitRequest::new(circuit);
    request.shots = shots;
    request.device = device;
    request.precision = precision;
    if let Some(path) = noise_model {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read noise model {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).context("Noise model is not valid JSON")?;
        request.noise_model = Some(value);
    }
    Ok(request)
}

fn print_status(status: &StatusResponse) -> Result<()> {
    let colored_status = match status.status.as_str() {
        "COMPLETED" => status.status.green().bold(),
        "FAILED" => status.status.red().bold(),
        "IGNORED" => status.status.yellow().bold(),
        _ => status.status.cyan().bold(),
    };
    println!("{} {}", "Status:".bold(), colored_status);
    println!();
    println!("{}", Table::new(vec![JobRow::from(status)]));

    if let Some(data) = &status.data {
        println!();
        println!("{}", serde_json::to_string_pretty(data)?);
    }
    Ok(())
}

async fn wait_and_print(
    client: &QJobClient,
    job_id: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<()> {
    println!("{}", format!("Waiting for job {}...", job_id).cyan());
    let status = client
        .wait_for_terminal(job_id, interval, timeout)
        .await
        .context("Failed while waiting for job")?;
    print_status(&status)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = QJobClient::connect(&cli.url)
        .await
        .context("Failed to create client")?;

    match cli.command {
        Commands::Submit {
            file,
            shots,
            device,
            precision,
            noise_model,
            wait,
        } => {
            let request = build_request(&file, shots, device, precision, noise_model.as_deref())?;
            let response = client
                .submit(&request)
                .await
                .context("Failed to submit job")?;

            let job_id = match (&response.job_id, response.is_submitted()) {
                (Some(job_id), true) => job_id.clone(),
                _ => {
                    println!(
                        "{} {}",
                        format!("✗ Job {}", response.status).red().bold(),
                        response.reason.as_deref().unwrap_or_default()
                    );
                    if let Some(job_id) = &response.job_id {
                        println!("  {} {}", "Job ID:".bold(), job_id);
                    }
                    std::process::exit(1);
                }
            };

            println!("{}", "✓ Job submitted successfully".green().bold());
            println!("  {} {}", "Job ID:".bold(), job_id);

            if wait {
                println!();
                wait_and_print(
                    &client,
                    &job_id,
                    Duration::from_millis(500),
                    Duration::from_secs(3600),
                )
                .await?;
            }
        }

        Commands::Status { job_id } => match client.status(&job_id).await {
            Ok(status) => print_status(&status)?,
            Err(SdkError::NotFound(id)) => {
                println!("{}", format!("✗ Job {} not found", id).red().bold());
                std::process::exit(1);
            }
            Err(e) => return Err(e).context("Failed to fetch job status"),
        },

        Commands::Wait {
            job_id,
            interval_ms,
            timeout_secs,
        } => {
            wait_and_print(
                &client,
                &job_id,
                Duration::from_millis(interval_ms),
                Duration::from_secs(timeout_secs),
            )
            .await?;
        }
    }

    Ok(())
}
