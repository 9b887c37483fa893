use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use mm_common::errors::MatchError;

/// API-facing error. Each kind maps to a distinct HTTP status so clients
/// can tell not-found from bad-request from service-unavailable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Internals stay out of responses; the log line has the rest.
            ApiError::Internal(_) => "internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();

        error!(code, status = %status, error = %self, "api_error");

        let body = Json(ErrorResponse {
            code,
            message: self.public_message(),
        });

        (status, body).into_response()
    }
}

impl From<MatchError> for ApiError {
    fn from(value: MatchError) -> Self {
        match value {
            MatchError::ProfileNotFound(id) => ApiError::NotFound(format!("profile {id}")),
            MatchError::NoEmbedding(id) => {
                ApiError::Conflict(format!("profile {id} has no embedding yet"))
            }
            MatchError::DimensionMismatch { expected, actual } => ApiError::BadRequest(format!(
                "embedding dimension mismatch: expected {expected}, got {actual}"
            )),
            MatchError::ProviderUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            MatchError::Cancelled => {
                ApiError::ServiceUnavailable("request timed out or was cancelled".into())
            }
            MatchError::EmptyIndex => {
                // The engine reports this as a normal empty result; if it
                // escapes to here something is wired wrong.
                ApiError::Internal("unexpected empty-index error".into())
            }
            MatchError::Config(msg) => ApiError::Internal(msg),
            MatchError::Store(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_distinct_per_kind() {
        let not_found: ApiError = MatchError::ProfileNotFound("x".into()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let conflict: ApiError = MatchError::NoEmbedding("x".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let bad: ApiError = MatchError::DimensionMismatch {
            expected: 256,
            actual: 3,
        }
        .into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let unavailable: ApiError = MatchError::ProviderUnavailable("down".into()).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let internal: ApiError = MatchError::Store("boom".into()).into();
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err: ApiError = MatchError::Store("password=hunter2".into()).into();
        assert_eq!(err.public_message(), "internal server error");
    }
}
