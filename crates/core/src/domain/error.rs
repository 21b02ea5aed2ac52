// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("Invalid run configuration: {0}")]
    InvalidRunConfig(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
