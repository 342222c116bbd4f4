use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docx_core::control::ControlError;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error response: a status code and a JSON `{ "error": message }` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "missing or invalid API key".to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            message: "request timed out".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        if err.is_not_found() {
            return Self::not_found(err.to_string());
        }
        if err.is_client_error() {
            return Self::bad_request(err.to_string());
        }
        match err {
            ControlError::Conflict(message) => {
                return Self {
                    status: StatusCode::CONFLICT,
                    message,
                };
            }
            ControlError::Job(err) => {
                return Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: err.to_string(),
                };
            }
            _ => {}
        }
        warn!(error = %err, "request failed");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse { error: self.message });
        (self.status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use docx_core::editor::DocumentError;

    use super::*;

    #[test]
    fn control_errors_map_to_statuses() {
        use docx_core::services::JobError;

        let cases = [
            (ControlError::NotFound("Document not found: x".into()), StatusCode::NOT_FOUND),
            (ControlError::InvalidInput("title is required".into()), StatusCode::BAD_REQUEST),
            (ControlError::Conflict("already accepted".into()), StatusCode::CONFLICT),
            (
                ControlError::Document(DocumentError::IndexOutOfRange {
                    what: "paragraph",
                    index: 4,
                    len: 1,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (ControlError::Job(JobError::Closed), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
