//! HTTP error envelope.
//!
//! # Responsibility
//! - Map core failures onto `400`/`404`/`500` responses.
//! - Render every failure as `{"error": <kind>, "message": <text>}`.
//!
//! # Invariants
//! - Internal failures are logged exactly once, where they are mapped.
//! - In production, internal failure details never leave the process.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::{Deserialize, Serialize};
use taskboard_core::logging::sanitize_message;
use taskboard_core::{AppEnvironment, TaskServiceError, TaskValidationError};
use thiserror::Error;

const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";
const MAX_LOGGED_ERROR_CHARS: usize = 300;

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] TaskValidationError),

    #[error("{0}")]
    MalformedRequest(String),

    #[error("Task not found")]
    TaskNotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Maps a service failure, logging and (in production) masking internal ones.
    pub fn from_service(err: TaskServiceError, environment: AppEnvironment) -> Self {
        match err {
            TaskServiceError::Validation(validation) => Self::Validation(validation),
            TaskServiceError::TaskNotFound(_) => Self::TaskNotFound,
            other => {
                let detail = other.to_string();
                error!(
                    "event=request_failed module=api status=error error={}",
                    sanitize_message(&detail, MAX_LOGGED_ERROR_CHARS)
                );
                if environment.is_production() {
                    Self::Internal(GENERIC_INTERNAL_MESSAGE.to_string())
                } else {
                    Self::Internal(detail)
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::TaskNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable error kind; the canonical reason phrase of the status.
    pub fn kind(&self) -> &'static str {
        self.status_code()
            .canonical_reason()
            .unwrap_or("Internal Server Error")
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::TaskNotFound
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use taskboard_core::{
        AppEnvironment, DbError, FieldProblem, RepoError, TaskServiceError, TaskValidationError,
    };
    use uuid::Uuid;

    #[test]
    fn kinds_follow_status_reason_phrases() {
        let validation = ApiError::from(TaskValidationError::single("title", FieldProblem::Missing));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.kind(), "Bad Request");
        assert_eq!(validation.body().message, "title is required");

        assert_eq!(ApiError::TaskNotFound.kind(), "Not Found");
        assert_eq!(
            ApiError::Internal("boom".to_string()).kind(),
            "Internal Server Error"
        );
    }

    #[test]
    fn not_found_service_error_maps_to_404() {
        let err = ApiError::from_service(
            TaskServiceError::TaskNotFound(Uuid::new_v4()),
            AppEnvironment::Production,
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.body().message, "Task not found");
    }

    #[test]
    fn production_hides_internal_details() {
        let make = || TaskServiceError::Repo(RepoError::Db(DbError::PoolClosed));

        let dev = ApiError::from_service(make(), AppEnvironment::Development);
        assert_eq!(dev.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(dev.body().message, "database pool is closed");

        let prod = ApiError::from_service(make(), AppEnvironment::Production);
        assert_eq!(prod.body().message, "Something went wrong");
    }
}
