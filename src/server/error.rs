//! JSON error responses
//!
//! Every failure leaves the server as `{"error": <message>, "code": <CODE>}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::improver::ImproveError;
use crate::jobs::QueueClosed;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Job not found")]
    JobNotFound,

    /// Provider failure on the synchronous path
    #[error("Error calling text improvement provider: {0}")]
    Upstream(#[from] ImproveError),

    #[error(transparent)]
    ShuttingDown(#[from] QueueClosed),

    /// The request could not be decoded at all
    #[error("{message}")]
    BadRequest { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::JobNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::ShuttingDown(_) => (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN"),
            // Well-formed bodies with the wrong shape are validation failures too
            ApiError::BadRequest { status, .. } if *status == StatusCode::UNPROCESSABLE_ENTITY => {
                (*status, "VALIDATION_ERROR")
            }
            ApiError::BadRequest { status, .. } => (*status, "BAD_REQUEST"),
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(ValidationError::Blank).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::JobNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ImproveError::EmptyCompletion).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(QueueClosed).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_upstream_message_names_the_cause() {
        let err = ApiError::from(ImproveError::Api { status: 429, body: "slow down".to_string() });
        assert_eq!(
            err.to_string(),
            "Error calling text improvement provider: provider returned 429: slow down"
        );
    }
}
