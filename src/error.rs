//! Error types for the email assistant.
//!
//! Input and document errors live next to the code that raises them
//! (`input::InvalidInput`, `extract::ExtractError`). This module holds the
//! taxonomy shared by the LLM layer, the pipeline and startup.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// Provider-specific failure types are translated into these variants by the
/// adapter in `llm::rig_adapter`; nothing above the LLM layer sees them.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} quota exceeded: {reason}")]
    RateLimited { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Model {model} not available on provider {provider}")]
    ModelNotAvailable { provider: String, model: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

impl LlmError {
    /// How the HTTP boundary should treat this failure.
    pub fn kind(&self) -> LlmFailureKind {
        match self {
            LlmError::RateLimited { .. } => LlmFailureKind::QuotaExceeded,
            LlmError::AuthFailed { .. } | LlmError::ModelNotAvailable { .. } => {
                LlmFailureKind::Configuration
            }
            LlmError::RequestFailed { .. }
            | LlmError::InvalidResponse { .. }
            | LlmError::Timeout { .. } => LlmFailureKind::Upstream,
        }
    }
}

/// Coarse classification of provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmFailureKind {
    /// Quota or rate limit hit. The caller may retry later.
    QuotaExceeded,
    /// Bad credential or model name. Fatal until the deployment is fixed.
    Configuration,
    /// Transient or unexplained provider failure. May be retried.
    Upstream,
}

/// Pipeline stage failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    ClassificationFailed(LlmError),

    #[error("Response generation failed: {0}")]
    ResponseGenerationFailed(LlmError),
}

impl PipelineError {
    /// The provider failure behind the stage error.
    pub fn llm_error(&self) -> &LlmError {
        match self {
            PipelineError::ClassificationFailed(e) | PipelineError::ResponseGenerationFailed(e) => e,
        }
    }
}
