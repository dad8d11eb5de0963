//! Protocol error types.

use thiserror::Error;

use crate::responses::ExceptionResponse;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors surfaced to remote-process clients.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Process not found.
    #[error("Process not found: {0}")]
    NoSuchProcess(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    NoSuchJob(String),

    /// Results requested before the job succeeded.
    #[error("Result not ready: {0}")]
    ResultNotReady(String),

    /// Invalid input binding or value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The job ran and failed.
    #[error("Process execution failed: {0}")]
    ExecutionFailed(String),

    /// Metalink encoding or decoding failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ProtocolError::NoSuchProcess(_) => 404,
            ProtocolError::NoSuchJob(_) => 404,
            ProtocolError::ResultNotReady(_) => 404,
            ProtocolError::InvalidParameter(_) => 400,
            ProtocolError::ExecutionFailed(_) => 500,
            ProtocolError::Xml(_) => 500,
            ProtocolError::Internal(_) => 500,
        }
    }

    /// Convert to an ExceptionResponse.
    pub fn to_exception(&self) -> ExceptionResponse {
        match self {
            ProtocolError::NoSuchProcess(msg) => ExceptionResponse::no_such_process(msg),
            ProtocolError::NoSuchJob(msg) => ExceptionResponse::no_such_job(msg),
            ProtocolError::ResultNotReady(msg) => ExceptionResponse::result_not_ready(msg),
            ProtocolError::InvalidParameter(msg) => ExceptionResponse::invalid_parameter(msg),
            ProtocolError::ExecutionFailed(msg) => ExceptionResponse::execution_failed(msg),
            ProtocolError::Xml(msg) => ExceptionResponse::internal_error(msg),
            ProtocolError::Internal(msg) => ExceptionResponse::internal_error(msg),
        }
    }
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ProtocolError::NoSuchProcess("x".to_string()).status_code(), 404);
        assert_eq!(ProtocolError::NoSuchJob("x".to_string()).status_code(), 404);
        assert_eq!(ProtocolError::InvalidParameter("x".to_string()).status_code(), 400);
        assert_eq!(ProtocolError::ExecutionFailed("x".to_string()).status_code(), 500);
    }

    #[test]
    fn test_execution_failed_keeps_cause() {
        let err = ProtocolError::ExecutionFailed(
            "The number of files for each input must be equal".to_string(),
        );
        let exc = err.to_exception();

        assert_eq!(exc.status, Some(500));
        assert!(exc.detail.unwrap().contains("must be equal"));
    }

    #[test]
    fn test_error_display() {
        let err = ProtocolError::NoSuchProcess("tg_mean".to_string());
        assert_eq!(err.to_string(), "Process not found: tg_mean");
    }
}
