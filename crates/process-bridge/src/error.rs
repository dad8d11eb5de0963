//! Error types for the process bridge.

use indicators::IndicatorError;
use thiserror::Error;
use wps_protocol::ProtocolError;

/// Errors raised while building the process catalog or running a job.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// One indicator's metadata could not be turned into a process.
    #[error("Malformed metadata for indicator {identifier}: {reason}")]
    Catalog { identifier: String, reason: String },

    /// An input reference could not be downloaded or opened.
    #[error("Failed to resolve input {reference}: {reason}")]
    InputResolution { reference: String, reason: String },

    /// The indicator rejected its inputs.
    #[error("{0}")]
    Computation(String),

    /// An artifact could not be written.
    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    /// A request input is unknown, missing or malformed.
    #[error("Invalid input {name}: {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn resolution(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::InputResolution {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Catalog { .. } => "catalog",
            Self::InputResolution { .. } => "input_resolution",
            Self::Computation(_) => "computation",
            Self::Write { .. } => "write",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Io(_) => "io",
        }
    }
}

impl From<IndicatorError> for BridgeError {
    fn from(err: IndicatorError) -> Self {
        Self::Computation(err.to_string())
    }
}

impl From<BridgeError> for ProtocolError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidInput { .. } => ProtocolError::InvalidParameter(err.to_string()),
            other => ProtocolError::ExecutionFailed(other.to_string()),
        }
    }
}
