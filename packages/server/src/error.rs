use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::CoreError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Core(CoreError),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Core(err) => core_status_and_body(err),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

fn core_status_and_body(err: CoreError) -> (StatusCode, ErrorBody) {
    let message = err.to_string();
    match err {
        CoreError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                code: "NOT_FOUND",
                message,
            },
        ),
        CoreError::AlreadyExists { .. } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "ALREADY_EXISTS",
                message,
            },
        ),
        CoreError::InvalidStateTransition { .. } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "INVALID_STATE_TRANSITION",
                message,
            },
        ),
        CoreError::RuleViolation { .. } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "RULE_VIOLATION",
                message,
            },
        ),
        CoreError::ReferenceInvalid { .. } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "REFERENCE_INVALID",
                message,
            },
        ),
        CoreError::Conflict { .. } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "CONFLICT",
                message,
            },
        ),
        // The mutation may still apply; the caller must re-read.
        CoreError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody {
                code: "TIMEOUT",
                message,
            },
        ),
        CoreError::StorageUnavailable { .. } | CoreError::Shutdown => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody {
                code: "STORAGE_UNAVAILABLE",
                message,
            },
        ),
        CoreError::Fatal { .. } => {
            tracing::error!("Fatal storage error surfaced to a request: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "INTERNAL_ERROR",
                    message: "An unexpected error occurred".into(),
                },
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}
