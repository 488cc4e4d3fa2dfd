//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.
//!
//! This is the only module that sees provider failures. They arrive as
//! rig `CompletionError`s and are mapped to `LlmError` by matching the
//! provider's error text, see `classify_provider_failure`.

use std::time::Duration;

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// `LlmProvider` backed by any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
    timeout: Duration,
}

impl<M> RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    pub fn new(model: M, model_name: &str, provider: &'static str, timeout: Duration) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
            timeout,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let parts = split_messages(request.messages).ok_or_else(|| LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: "completion request has no user message".to_string(),
        })?;

        let mut builder = self
            .model
            .completion_request(Message::user(parts.prompt))
            .messages(parts.history);
        if let Some(preamble) = parts.preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| {
                warn!(provider = self.provider, timeout = ?self.timeout, "LLM call timed out");
                LlmError::Timeout {
                    provider: self.provider.to_string(),
                    timeout: self.timeout,
                }
            })?
            .map_err(|e| classify_provider_failure(self.provider, &self.model_name, &e.to_string()))?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|item| match item {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        debug!(
            provider = self.provider,
            model = %self.model_name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM call complete"
        );

        Ok(CompletionResponse {
            content,
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX),
        })
    }
}

/// A chat transcript reshaped for rig: system text, prior turns, final prompt.
struct SplitMessages {
    preamble: Option<String>,
    history: Vec<Message>,
    prompt: String,
}

/// Returns `None` when the transcript does not end with a user message.
fn split_messages(messages: Vec<ChatMessage>) -> Option<SplitMessages> {
    let mut system = Vec::new();
    let mut turns = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system.push(message.content),
            Role::User | Role::Assistant => turns.push(message),
        }
    }

    let last = turns.pop()?;
    if last.role != Role::User {
        return None;
    }

    let history = turns
        .into_iter()
        .map(|m| match m.role {
            Role::Assistant => Message::assistant(m.content),
            _ => Message::user(m.content),
        })
        .collect();

    Some(SplitMessages {
        preamble: (!system.is_empty()).then(|| system.join("\n\n")),
        history,
        prompt: last.content,
    })
}

/// Map a provider failure message onto the internal taxonomy.
///
/// Providers report quota exhaustion as HTTP 429 or `RESOURCE_EXHAUSTED`,
/// and credential problems as 401/403.
pub fn classify_provider_failure(provider: &str, model: &str, message: &str) -> LlmError {
    let lower = message.to_lowercase();

    if has_status_code(&lower, "429")
        || lower.contains("quota")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("resource_exhausted")
    {
        return LlmError::RateLimited {
            provider: provider.to_string(),
            reason: message.to_string(),
        };
    }

    if has_status_code(&lower, "401")
        || has_status_code(&lower, "403")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("invalid_api_key")
        || lower.contains("authentication")
    {
        return LlmError::AuthFailed {
            provider: provider.to_string(),
        };
    }

    if lower.contains("model_not_found")
        || (lower.contains("model") && (lower.contains("not found") || lower.contains("does not exist")))
    {
        return LlmError::ModelNotAvailable {
            provider: provider.to_string(),
            model: model.to_string(),
        };
    }

    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: message.to_string(),
    }
}

/// True when `code` appears as a standalone token, not inside a longer
/// number such as a token count.
fn has_status_code(message: &str, code: &str) -> bool {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == code)
}
