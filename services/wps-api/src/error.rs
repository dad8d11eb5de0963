//! Mapping of protocol errors onto HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use wps_protocol::ProtocolError;

/// Error returned by handlers, rendered as an OGC exception document.
#[derive(Debug)]
pub struct ApiError(pub ProtocolError);

impl<E: Into<ProtocolError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let json = serde_json::to_string(&self.0.to_exception()).unwrap_or_default();
        (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = ApiError(ProtocolError::NoSuchProcess("nope".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(ProtocolError::InvalidParameter("freq".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = process_bridge::BridgeError::Computation("boom".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
