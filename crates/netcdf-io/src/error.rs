//! Error types for NetCDF dataset operations.

use thiserror::Error;

/// Result type for NetCDF dataset operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF dataset access.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The dataset could not be opened
    #[error("Failed to open {location}: {message}")]
    Open { location: String, message: String },

    /// Missing required variable or dimension
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Values do not match the declared shape
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Time coordinate could not be decoded
    #[error("Invalid time coordinate: {0}")]
    Time(String),

    /// Writing a dataset failed
    #[error("Write failed: {0}")]
    Write(String),
}

impl From<netcdf::Error> for NetCdfError {
    fn from(err: netcdf::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}
