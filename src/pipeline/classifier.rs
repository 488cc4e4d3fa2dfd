//! Classification stage: decides whether an email needs action.
//!
//! One LLM call with a fixed rubric. The model must answer with a JSON object
//! matching `ClassificationResult`; anything that does not decode into that
//! shape fails the stage instead of falling back to a default.

use std::sync::{Arc, LazyLock};

use tracing::{debug, warn};

use crate::error::{LlmError, PipelineError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::ClassificationResult;

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Max tokens for the classification call. The answer is a two-field object.
const CLASSIFY_MAX_TOKENS: u32 = 256;

/// JSON Schema of the expected answer, embedded in the prompt.
static RESULT_SCHEMA: LazyLock<String> = LazyLock::new(|| {
    serde_json::to_string_pretty(&schemars::schema_for!(ClassificationResult)).unwrap_or_default()
});

/// Runs the classification call against a shared provider.
pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Classify one email.
    pub async fn classify(&self, email_text: &str) -> Result<ClassificationResult, PipelineError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classification_system_prompt()),
            ChatMessage::user(build_classification_user_prompt(email_text)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(PipelineError::ClassificationFailed)?;

        let result = parse_classification(&response.content).map_err(|reason| {
            warn!(
                raw_response = %response.content,
                error = %reason,
                "Failed to decode classification"
            );
            PipelineError::ClassificationFailed(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason,
            })
        })?;

        debug!(
            is_productive = result.is_productive,
            confidence = result.confidence,
            "Email classified"
        );
        Ok(result)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classification_system_prompt() -> String {
    format!(
        "You classify emails received by a financial services company.\n\n\
         An email is PRODUCTIVE if it:\n\
         - Requests status of a pending request\n\
         - Asks a relevant business question\n\
         - Shares important documents or information\n\
         - Requires some action or response\n\n\
         An email is UNPRODUCTIVE if it:\n\
         - Is a greeting or holiday message (e.g., Merry Christmas, Happy New Year)\n\
         - Contains spam or irrelevant content\n\
         - Is a generic thank you without any request\n\n\
         Respond with ONLY a JSON object matching this schema, with no other fields:\n\
         {}\n\n\
         Example: {{\"is_productive\": true, \"confidence\": 0.92}}",
        *RESULT_SCHEMA
    )
}

fn build_classification_user_prompt(email_text: &str) -> String {
    format!("Email:\n{email_text}\n\nClassify this email and provide your confidence level.")
}

// ── Response parsing ────────────────────────────────────────────────

/// Decode the model's answer.
///
/// The first complete JSON object wins, so markdown fences, a leading
/// sentence or a trailing note around it are ignored. Finite confidences
/// outside [0, 1] are clamped; NaN and infinities are rejected.
fn parse_classification(raw: &str) -> Result<ClassificationResult, String> {
    let result: ClassificationResult = serde_json::Deserializer::from_str(json_candidate(raw))
        .into_iter::<ClassificationResult>()
        .next()
        .ok_or_else(|| "empty response".to_string())?
        .map_err(|e| format!("JSON parse error: {e}"))?;

    if !result.confidence.is_finite() {
        return Err(format!("confidence is not a number: {}", result.confidence));
    }

    Ok(ClassificationResult {
        confidence: result.confidence.clamp(0.0, 1.0),
        ..result
    })
}

/// LLM output from the first `{` onward.
fn json_candidate(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.find('{') {
        Some(start) => &trimmed[start..],
        None => trimmed,
    }
}
