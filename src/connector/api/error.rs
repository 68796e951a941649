use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::DomainError;

/// Error envelope for every endpoint: `{"error": "<message>"}`.
///
/// Caller mistakes map to 400, everything else to 500.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn message(&self) -> String {
        match &self.0 {
            DomainError::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(DomainError::invalid_input(format!(
            "expected a multipart or URL-encoded form: {}",
            rejection.body_text()
        )))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self(DomainError::invalid_input(format!(
            "invalid form body: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(DomainError::invalid_input(format!(
            "invalid multipart body: {}",
            err.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Rejected request: {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_bad_request_with_bare_message() {
        let err = ApiError::from(DomainError::invalid_input("Invalid ohlc_json: EOF"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid ohlc_json: EOF");
    }

    #[test]
    fn backend_failures_are_server_errors() {
        let err = ApiError::from(DomainError::backend_timeout("after 120s"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Backend timed out: after 120s");
    }
}
