//! Maps internal failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::error::{LlmFailureKind, PipelineError};
use crate::input::InvalidInput;

/// Everything a request handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// The request body could not be decoded at all.
    #[error("{0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Detail is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status code, machine-readable code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::InvalidInput(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_input",
                e.to_string(),
            ),
            ApiError::MalformedRequest(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", msg.clone())
            }
            ApiError::Pipeline(e) => match e.llm_error().kind() {
                LlmFailureKind::QuotaExceeded => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "quota_exceeded",
                    "AI service quota exceeded. Please try again later.".to_string(),
                ),
                LlmFailureKind::Configuration => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "AI service is not configured correctly.".to_string(),
                ),
                LlmFailureKind::Upstream => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "AI service is temporarily unavailable. Please try again later.".to_string(),
                ),
            },
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An unexpected error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            ApiError::InvalidInput(_) | ApiError::MalformedRequest(_) => {
                warn!(status = status.as_u16(), reason = %self, "Rejected request");
            }
            ApiError::Pipeline(e) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %e, "LLM provider misconfigured");
            }
            ApiError::Pipeline(e) => {
                warn!(status = status.as_u16(), error = %e, "LLM provider failure");
            }
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Unexpected failure");
            }
        }

        (
            status,
            Json(serde_json::json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}
