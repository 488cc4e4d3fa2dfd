//! Response stage: drafts a reply or returns the canned notice.

use std::sync::Arc;

use tracing::debug;

use crate::error::{LlmError, PipelineError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{Outcome, PipelineState};

/// Reply for emails that need no action. Sent without any model call.
pub const DEFAULT_UNPRODUCTIVE_RESPONSE: &str = "Agradecemos o seu contato. Esta mensagem foi classificada como não requerendo ação. \
     Caso tenha uma solicitação específica, por favor envie um novo email detalhando sua necessidade.";

/// Max tokens for a drafted reply.
const REPLY_MAX_TOKENS: u32 = 1024;

pub struct Responder {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl Responder {
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Fill in `suggested_response` according to the classification outcome.
    pub async fn respond(
        &self,
        state: PipelineState,
        outcome: Outcome,
    ) -> Result<PipelineState, PipelineError> {
        match outcome {
            Outcome::Productive => {
                let reply = self.generate(state.email_text()).await?;
                Ok(state.with_response(reply))
            }
            Outcome::Unproductive => Ok(default_response(state)),
        }
    }

    /// Draft a reply with the model.
    async fn generate(&self, email_text: &str) -> Result<String, PipelineError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_reply_system_prompt()),
            ChatMessage::user(build_reply_user_prompt(email_text)),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(REPLY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(PipelineError::ResponseGenerationFailed)?;

        if response.content.trim().is_empty() {
            return Err(PipelineError::ResponseGenerationFailed(
                LlmError::InvalidResponse {
                    provider: self.llm.model_name().to_string(),
                    reason: "model returned an empty reply".to_string(),
                },
            ));
        }

        debug!(chars = response.content.chars().count(), "Reply drafted");
        Ok(response.content)
    }
}

/// The unproductive branch. Infallible and free of side effects.
pub fn default_response(state: PipelineState) -> PipelineState {
    state.with_response(DEFAULT_UNPRODUCTIVE_RESPONSE)
}

fn build_reply_system_prompt() -> String {
    "You are a helpful assistant for a financial company.\n\
     Generate a professional and helpful response to the email you are given.\n\
     Keep the response concise and in Portuguese (Brazil).\n\
     Reply with the response text only, without a subject line or commentary."
        .to_string()
}

fn build_reply_user_prompt(email_text: &str) -> String {
    format!("Email:\n{email_text}\n\nResponse:")
}
