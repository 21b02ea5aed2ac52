// Run Configuration Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, Result};

/// Simulation device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Device {
    Cpu,
    Gpu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Gpu => write!(f, "GPU"),
        }
    }
}

impl std::str::FromStr for Device {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CPU" => Ok(Device::Cpu),
            "GPU" => Ok(Device::Gpu),
            other => Err(DomainError::InvalidRunConfig(format!(
                "unknown device '{}' (expected CPU or GPU)",
                other
            ))),
        }
    }
}

/// Floating point precision of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    Double,
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Single => write!(f, "single"),
            Precision::Double => write!(f, "double"),
        }
    }
}

impl std::str::FromStr for Precision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Precision::Single),
            "double" => Ok(Precision::Double),
            other => Err(DomainError::InvalidRunConfig(format!(
                "unknown precision '{}' (expected single or double)",
                other
            ))),
        }
    }
}

/// Values applied when a submission omits a field
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfigDefaults {
    pub device: Device,
    pub precision: Precision,
    pub shots: u64,
    pub blocking_enabled: bool,
    pub blocking_unit: u32,
}

impl Default for RunConfigDefaults {
    fn default() -> Self {
        Self {
            device: Device::Gpu,
            precision: Precision::Single,
            shots: 1024,
            blocking_enabled: true,
            blocking_unit: 23,
        }
    }
}

/// Simulator options attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub device: Device,
    pub precision: Precision,
    pub shots: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_model: Option<Value>,
    pub blocking_enabled: bool,
    pub blocking_unit: u32,
}

impl RunConfig {
    /// Run configuration made only of defaults
    pub fn from_defaults(defaults: &RunConfigDefaults) -> Self {
        Self {
            device: defaults.device,
            precision: defaults.precision,
            shots: defaults.shots,
            noise_model: None,
            blocking_enabled: defaults.blocking_enabled,
            blocking_unit: defaults.blocking_unit,
        }
    }

    /// Build a run configuration from the loosely typed fields of a
    /// submission body. Missing or `null` fields take their default.
    ///
    /// Accepted spellings:
    /// - `shots`, `blocking_unit`: positive integer, or a string holding one
    /// - `noise_model`: JSON object, or a string containing an embedded JSON object
    /// - `blocking_enabled`: bool, `"true"`/`"false"`, or `0`/`1`
    pub fn from_request(options: &Map<String, Value>, defaults: &RunConfigDefaults) -> Result<Self> {
        let mut config = Self::from_defaults(defaults);

        if let Some(value) = present(options, "device") {
            config.device = as_str(value, "device")?.parse()?;
        }
        if let Some(value) = present(options, "precision") {
            config.precision = as_str(value, "precision")?.parse()?;
        }
        if let Some(value) = present(options, "shots") {
            config.shots = positive_integer(value, "shots")?;
        }
        if let Some(value) = present(options, "noise_model") {
            config.noise_model = noise_model(value)?;
        }
        if let Some(value) = present(options, "blocking_enabled") {
            config.blocking_enabled = boolean(value, "blocking_enabled")?;
        }
        if let Some(value) = present(options, "blocking_unit") {
            let unit = positive_integer(value, "blocking_unit")?;
            config.blocking_unit = u32::try_from(unit).map_err(|_| {
                DomainError::InvalidRunConfig(format!("blocking_unit {} is too large", unit))
            })?;
        }

        Ok(config)
    }
}

fn present<'a>(options: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    options.get(key).filter(|v| !v.is_null())
}

fn as_str<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| DomainError::InvalidRunConfig(format!("{} must be a string", field)))
}

fn positive_integer(value: &Value, field: &str) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n > 0 => Ok(n),
        _ => Err(DomainError::InvalidRunConfig(format!(
            "{} must be a positive integer, got {}",
            field, value
        ))),
    }
}

fn boolean(value: &Value, field: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(DomainError::InvalidRunConfig(format!(
                "{} must be a boolean, got {}",
                field, value
            ))),
        },
        _ => Err(DomainError::InvalidRunConfig(format!(
            "{} must be a boolean, got {}",
            field, value
        ))),
    }
}

fn noise_model(value: &Value) -> Result<Option<Value>> {
    match value {
        Value::Object(_) => Ok(Some(value.clone())),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => Ok(Some(parsed)),
            Ok(Value::Null) => Ok(None),
            Ok(_) => Err(DomainError::InvalidRunConfig(
                "noise_model must encode a JSON object".to_string(),
            )),
            Err(e) => Err(DomainError::InvalidRunConfig(format!(
                "noise_model is not valid JSON: {}",
                e
            ))),
        },
        _ => Err(DomainError::InvalidRunConfig(
            "noise_model must be a JSON object or a string containing one".to_string(),
        )),
    }
}
