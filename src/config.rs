//! Service configuration, built from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Everything the binary needs to start serving.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub llm: LlmConfig,
    pub bind: SocketAddr,
    pub cors_origins: Vec<String>,
}

impl ServiceConfig {
    /// Build config from the process environment.
    ///
    /// Fails if the API key is missing or any value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("LLM_BACKEND").as_deref().map(str::trim) {
            None | Some("openai") => LlmBackend::OpenAi,
            Some("anthropic") => LlmBackend::Anthropic,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LLM_BACKEND".into(),
                    message: format!("unknown backend '{other}', expected 'openai' or 'anthropic'"),
                });
            }
        };

        let api_key = get("LLM_API_KEY")
            .or_else(|| get(backend.api_key_var()))
            .ok_or_else(|| {
                ConfigError::MissingEnvVar(format!("LLM_API_KEY (or {})", backend.api_key_var()))
            })?;

        let model = get("LLM_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => parse_temperature(&raw)?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LLM_TIMEOUT_SECS".into(),
                        message: format!("'{raw}' is not a positive number of seconds"),
                    });
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let bind_raw = get("EMAIL_ASSISTANT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "EMAIL_ASSISTANT_BIND".into(),
                message: format!("'{bind_raw}': {e}"),
            })?;

        let cors_origins: Vec<String> = get("EMAIL_ASSISTANT_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: secrecy::SecretString::from(api_key),
                model,
                temperature,
                timeout: Duration::from_secs(timeout_secs),
            },
            bind,
            cors_origins,
        })
    }
}

fn parse_temperature(raw: &str) -> Result<f32, ConfigError> {
    match raw.trim().parse::<f32>() {
        Ok(t) if (0.0..=2.0).contains(&t) => Ok(t),
        _ => Err(ConfigError::InvalidValue {
            key: "LLM_TEMPERATURE".into(),
            message: format!("'{raw}' is not a number between 0 and 2"),
        }),
    }
}
