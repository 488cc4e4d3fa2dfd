//! Email pipeline: classify, branch, respond.
//!
//! Flow:
//! 1. Classification stage → `ClassificationResult`
//! 2. Branch on `Outcome`
//! 3. Productive → drafted reply (second LLM call); Unproductive → canned notice
//!
//! Each stage runs at most once per invocation. Provider failures are not
//! caught here; they leave as `PipelineError` for the HTTP layer to map.

use std::sync::Arc;

use tracing::{Instrument, info, info_span};

use crate::error::{LlmError, PipelineError};
use crate::llm::{LlmConfig, LlmProvider, create_provider};
use crate::pipeline::classifier::Classifier;
use crate::pipeline::responder::Responder;
use crate::pipeline::types::{AssistantResult, PipelineState};

/// The assembled pipeline. Cheap to share behind an `Arc`; holds no
/// per-request state.
pub struct EmailPipeline {
    classifier: Classifier,
    responder: Responder,
}

impl EmailPipeline {
    /// Build a pipeline around an existing provider.
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&llm)),
            responder: Responder::new(llm, temperature),
        }
    }

    /// Build the provider from configuration, then the pipeline.
    ///
    /// Fails when the credential is blank or the client cannot be created.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let llm = create_provider(config)?;
        Ok(Self::new(llm, config.temperature))
    }

    /// Run one email through the pipeline.
    pub async fn invoke(&self, state: PipelineState) -> Result<AssistantResult, PipelineError> {
        let span = info_span!(
            "pipeline",
            chars = state.email_text().chars().count(),
            outcome = tracing::field::Empty,
        );

        async move {
            let classification = self.classifier.classify(state.email_text()).await?;
            let outcome = classification.outcome();
            tracing::Span::current().record("outcome", outcome.label());

            let state = state.with_classification(classification);
            let state = self.responder.respond(state, outcome).await?;

            info!(
                outcome = outcome.label(),
                confidence = state.confidence,
                "Email processed"
            );
            Ok::<_, PipelineError>(state.into_result())
        }
        .instrument(span)
        .await
    }

    /// Convenience wrapper: build the initial state from text and invoke.
    pub async fn process(&self, email_text: impl Into<String>) -> Result<AssistantResult, PipelineError> {
        self.invoke(PipelineState::new(email_text)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::llm::provider::{CompletionRequest, CompletionResponse};
    use crate::pipeline::responder::DEFAULT_UNPRODUCTIVE_RESPONSE;

    /// Stand-in LLM that replays scripted responses and records prompts.
    struct ScriptedLlm {
        responses: Mutex<Vec<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let prompt = request
                .messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.prompts.lock().unwrap().push(prompt);

            let mut responses = self.responses.lock().unwrap();
            assert!(!responses.is_empty(), "unexpected extra LLM call");
            responses.remove(0).map(|content| CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    fn classification(is_productive: bool, confidence: f64) -> Result<String, LlmError> {
        Ok(format!(
            r#"{{"is_productive": {is_productive}, "confidence": {confidence}}}"#
        ))
    }

    #[tokio::test]
    async fn unproductive_email_gets_default_reply_with_one_call() {
        let llm = ScriptedLlm::new(vec![classification(false, 0.97)]);
        let pipeline = EmailPipeline::new(llm.clone(), 0.7);

        let result = pipeline.process("Feliz Natal e um próspero Ano Novo!").await.unwrap();

        assert!(!result.is_productive);
        assert!((result.confidence - 0.97).abs() < 0.001);
        assert_eq!(result.suggested_response, DEFAULT_UNPRODUCTIVE_RESPONSE);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn productive_email_gets_generated_reply_with_two_calls() {
        let llm = ScriptedLlm::new(vec![
            classification(true, 0.91),
            Ok("Olá! Seu pedido #123 foi enviado ontem.".into()),
        ]);
        let pipeline = EmailPipeline::new(llm.clone(), 0.7);

        let result = pipeline.process("Qual o status do meu pedido?").await.unwrap();

        assert!(result.is_productive);
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(!result.suggested_response.is_empty());
        assert_ne!(result.suggested_response, DEFAULT_UNPRODUCTIVE_RESPONSE);
        assert_eq!(llm.calls(), 2);

        // Both stages see the same email text.
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts.iter().all(|p| p.contains("Qual o status do meu pedido?")));
    }

    #[tokio::test]
    async fn confidence_is_clamped_into_unit_interval() {
        let llm = ScriptedLlm::new(vec![classification(false, 4.2)]);
        let pipeline = EmailPipeline::new(llm, 0.7);

        let result = pipeline.process("Obrigado!").await.unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn classification_failure_stops_before_generation() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::RateLimited {
            provider: "scripted".into(),
            reason: "429 RESOURCE_EXHAUSTED: quota exceeded".into(),
        })]);
        let pipeline = EmailPipeline::new(llm.clone(), 0.7);

        let err = pipeline.process("Qual o status do meu pedido?").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ClassificationFailed(LlmError::RateLimited { .. })
        ));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn generation_failure_is_not_replaced_by_default_reply() {
        let llm = ScriptedLlm::new(vec![
            classification(true, 0.8),
            Err(LlmError::RequestFailed {
                provider: "scripted".into(),
                reason: "Internal server error".into(),
            }),
        ]);
        let pipeline = EmailPipeline::new(llm, 0.7);

        let err = pipeline.process("Pode me enviar o contrato?").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ResponseGenerationFailed(LlmError::RequestFailed { .. })
        ));
    }

    #[test]
    fn from_config_rejects_blank_credential() {
        let config = LlmConfig {
            backend: crate::llm::LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from(""),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            timeout: std::time::Duration::from_secs(5),
        };
        assert!(matches!(
            EmailPipeline::from_config(&config),
            Err(LlmError::AuthFailed { .. })
        ));
    }
}
