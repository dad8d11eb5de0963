//! Error types for indicator computations.

use netcdf_io::NetCdfError;
use thiserror::Error;

/// Result type for indicator operations.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

#[derive(Error, Debug)]
pub enum IndicatorError {
    /// A required keyword argument was not supplied
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// An argument has the wrong kind or an unparsable value
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Inputs that must line up do not
    #[error("Input mismatch: {0}")]
    Mismatch(String),

    /// Units that cannot be converted
    #[error("Unsupported units: {0}")]
    Units(String),

    /// The parameter block of an indicator could not be parsed
    #[error("Malformed metadata for {identifier}: {reason}")]
    Metadata { identifier: String, reason: String },

    /// Reading or decoding input data failed
    #[error(transparent)]
    Data(#[from] NetCdfError),
}

impl IndicatorError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
