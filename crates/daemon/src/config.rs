//! Environment configuration for the server binary

use qjob_core::domain::{Device, Precision, RunConfigDefaults};
use qjob_core::error::{AppError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "~/.qjob/data";
const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_SIMULATOR: &str = "qasm_simulator";
const DEFAULT_SIMULATOR_ARGS: &str = "-";
const DEFAULT_SIM_TIMEOUT_SECS: u64 = 3600;

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "QJOB_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Everything the server reads from the environment
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub http_host: String,
    pub http_port: u16,
    pub simulator: PathBuf,
    pub simulator_args: Vec<String>,
    /// Zero disables the deadline
    pub sim_timeout: Duration,
    pub defaults: RunConfigDefaults,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    /// Read `QJOB_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build from an explicit variable map (unset keys take defaults)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let base = RunConfigDefaults::default();

        let data_dir = get("QJOB_DATA_DIR").unwrap_or(DEFAULT_DATA_DIR);
        let simulator_args = get("QJOB_SIMULATOR_ARGS")
            .unwrap_or(DEFAULT_SIMULATOR_ARGS)
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let defaults = RunConfigDefaults {
            device: parse_or(get("QJOB_DEFAULT_DEVICE"), "QJOB_DEFAULT_DEVICE", base.device)?,
            precision: parse_or(
                get("QJOB_DEFAULT_PRECISION"),
                "QJOB_DEFAULT_PRECISION",
                base.precision,
            )?,
            shots: positive(get("QJOB_DEFAULT_SHOTS"), "QJOB_DEFAULT_SHOTS", base.shots)?,
            blocking_enabled: parse_or(
                get("QJOB_DEFAULT_BLOCKING"),
                "QJOB_DEFAULT_BLOCKING",
                base.blocking_enabled,
            )?,
            blocking_unit: positive(
                get("QJOB_DEFAULT_BLOCKING_UNIT"),
                "QJOB_DEFAULT_BLOCKING_UNIT",
                base.blocking_unit,
            )?,
        };

        Ok(Self {
            data_dir: PathBuf::from(shellexpand::tilde(data_dir).into_owned()),
            http_host: get("QJOB_HTTP_HOST").unwrap_or(DEFAULT_HTTP_HOST).to_string(),
            http_port: parse_or(get("QJOB_HTTP_PORT"), "QJOB_HTTP_PORT", DEFAULT_HTTP_PORT)?,
            simulator: PathBuf::from(
                shellexpand::tilde(get("QJOB_SIMULATOR").unwrap_or(DEFAULT_SIMULATOR)).into_owned(),
            ),
            simulator_args,
            sim_timeout: Duration::from_secs(parse_or(
                get("QJOB_SIM_TIMEOUT_SECS"),
                "QJOB_SIM_TIMEOUT_SECS",
                DEFAULT_SIM_TIMEOUT_SECS,
            )?),
            defaults,
            log_format: get("QJOB_LOG_FORMAT")
                .map(LogFormat::from_str)
                .transpose()?
                .unwrap_or(LogFormat::Pretty),
        })
    }
}

fn parse_or<T>(value: Option<&str>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{}='{}' is invalid: {}", key, raw, e))),
    }
}

fn positive<T>(value: Option<&str>, key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let parsed = parse_or(value, key, default)?;
    if parsed <= T::default() {
        return Err(AppError::Config(format!("{} must be positive", key)));
    }
    Ok(parsed)
}
