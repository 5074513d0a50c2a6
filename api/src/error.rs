use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rejuuv_core::check_ins::CheckInError;
use rejuuv_core::completion::CompletionError;
use rejuuv_core::error::{self, ApiError};
use rejuuv_core::intake::IntakeError;
use rejuuv_core::plans::PlanRequestError;

use crate::store::StoreError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Missing or invalid bearer token (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Resource missing or not owned by the caller (404)
    NotFound { resource: String },
    /// Completion service call or response parsing failed (500)
    Completion(CompletionError),
    /// Store read failed (500)
    Database(StoreError),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Unauthorized { message, docs_hint } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: error::codes::UNAUTHORIZED.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Completion(err) => {
                tracing::error!(error = %err, "Completion stage failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::COMPLETION_FAILED.to_string(),
                        message: err.to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: Some(
                            "The guidance service could not produce a usable answer. Retry the request."
                                .to_string(),
                        ),
                    },
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: msg,
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized {
            message: "Unauthorized".to_string(),
            docs_hint: Some(
                "Include 'Authorization: Bearer <token>' with a valid session access token."
                    .to_string(),
            ),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err)
    }
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        AppError::Completion(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Failed to encode prompt payload: {err}"))
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        AppError::Validation {
            field: Some(err.field().to_string()),
            message: err.to_string(),
            received: None,
            docs_hint: Some("pain_level is 0-10 and body_area is required.".to_string()),
        }
    }
}

impl From<PlanRequestError> for AppError {
    fn from(err: PlanRequestError) -> Self {
        AppError::Validation {
            field: Some(err.field()),
            message: err.to_string(),
            received: None,
            docs_hint: Some(
                "Send the analysis from POST /assessments as 'assessment' together with its 'intake_data'."
                    .to_string(),
            ),
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        AppError::Validation {
            field: Some(err.field()),
            message: err.to_string(),
            received: None,
            docs_hint: Some(
                "recovery_plan_id, pain_change, pain_level, difficulty, and current_plan are required."
                    .to_string(),
            ),
        }
    }
}
