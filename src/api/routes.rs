//! REST endpoints: email submission and health.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::error::ApiError;
use crate::input::{DocumentUpload, MAX_UPLOAD_BYTES, validate_and_extract};
use crate::pipeline::{AssistantResult, EmailPipeline};

/// Body limit for the whole request. Slightly above the document ceiling so
/// the validator, not the transport, reports most oversized uploads.
const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EmailPipeline>,
}

/// Build the Axum router.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/assistant", post(assistant))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Assistant ───────────────────────────────────────────────────────────

/// JSON form of a submission.
#[derive(Debug, Default, Deserialize)]
struct AssistantRequest {
    #[serde(default)]
    email_text: Option<String>,
}

/// A decoded submission, before validation.
#[derive(Debug, Default)]
struct Submission {
    email_text: Option<String>,
    document: Option<DocumentUpload>,
}

/// POST /api/v1/assistant
///
/// Accepts `application/json` (`{"email_text": "..."}`) or
/// `multipart/form-data` with an `email_text` field or a `file` upload.
async fn assistant(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<AssistantResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("assistant", %request_id);

    async move {
        let submission = read_submission(request).await?;
        debug!(
            has_text = submission.email_text.is_some(),
            has_file = submission.document.is_some(),
            "Submission received"
        );

        // PDF parsing is CPU-bound; keep it off the async workers.
        let content = tokio::task::spawn_blocking(move || {
            validate_and_extract(
                submission.email_text.as_deref(),
                submission.document.as_ref(),
            )
        })
        .await
        .map_err(|e| ApiError::Internal(format!("validation task failed: {e}")))??;

        let result = state.pipeline.process(content).await?;
        info!(is_productive = result.is_productive, "Assistant request complete");
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}

async fn read_submission(request: Request) -> Result<Submission, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::MalformedRequest(e.body_text()))?;
        return read_multipart(multipart).await;
    }

    let Json(body) = Json::<AssistantRequest>::from_request(request, &())
        .await
        .map_err(|e| ApiError::MalformedRequest(e.body_text()))?;
    Ok(Submission {
        email_text: body.email_text,
        document: None,
    })
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "email_text" => {
                submission.email_text = Some(field.text().await.map_err(multipart_error)?);
            }
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                submission.document = Some(DocumentUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(submission)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::MalformedRequest(format!(
            "File too large. Maximum size: {}MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ));
    }
    ApiError::MalformedRequest(e.body_text())
}
