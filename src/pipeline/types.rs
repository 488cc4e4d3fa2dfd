//! Pipeline data model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// State threaded through the pipeline stages.
///
/// Each stage takes the previous state by value and returns the next one.
/// The email text is fixed at construction; the output fields are set by the
/// stage that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    email_text: String,
    pub is_productive: bool,
    pub confidence: f64,
    pub suggested_response: String,
}

impl PipelineState {
    /// Create the initial state for one email.
    pub fn new(email_text: impl Into<String>) -> Self {
        Self {
            email_text: email_text.into(),
            is_productive: false,
            confidence: 0.0,
            suggested_response: String::new(),
        }
    }

    pub fn email_text(&self) -> &str {
        &self.email_text
    }

    /// Record the classification stage's verdict.
    pub fn with_classification(self, result: ClassificationResult) -> Self {
        Self {
            is_productive: result.is_productive,
            confidence: result.confidence,
            ..self
        }
    }

    /// Record the response stage's reply.
    pub fn with_response(self, suggested_response: impl Into<String>) -> Self {
        Self {
            suggested_response: suggested_response.into(),
            ..self
        }
    }

    /// The output record returned to callers.
    pub fn into_result(self) -> AssistantResult {
        AssistantResult {
            is_productive: self.is_productive,
            confidence: self.confidence,
            suggested_response: self.suggested_response,
        }
    }
}

/// Structured output of the classification stage.
///
/// This is also the JSON shape the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassificationResult {
    /// Whether the email is productive (requires action) or unproductive (greetings, spam, etc.)
    pub is_productive: bool,
    /// Confidence score between 0 and 1
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn outcome(&self) -> Outcome {
        if self.is_productive {
            Outcome::Productive
        } else {
            Outcome::Unproductive
        }
    }
}

/// Which branch the response stage takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Needs a drafted reply.
    Productive,
    /// Gets the canned notice, no model call.
    Unproductive,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Productive => "productive",
            Outcome::Unproductive => "unproductive",
        }
    }
}

/// Final result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResult {
    pub is_productive: bool,
    pub confidence: f64,
    pub suggested_response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_defaults() {
        let state = PipelineState::new("hello");
        assert_eq!(state.email_text(), "hello");
        assert!(!state.is_productive);
        assert_eq!(state.confidence, 0.0);
        assert!(state.suggested_response.is_empty());
    }

    #[test]
    fn stages_fill_only_their_fields() {
        let state = PipelineState::new("Can you send the Q3 report?")
            .with_classification(ClassificationResult {
                is_productive: true,
                confidence: 0.9,
            })
            .with_response("Claro, segue em anexo.");

        assert_eq!(state.email_text(), "Can you send the Q3 report?");
        let result = state.into_result();
        assert!(result.is_productive);
        assert!((result.confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(result.suggested_response, "Claro, segue em anexo.");
    }

    #[test]
    fn outcome_follows_flag() {
        let productive = ClassificationResult {
            is_productive: true,
            confidence: 0.5,
        };
        let unproductive = ClassificationResult {
            is_productive: false,
            confidence: 0.5,
        };
        assert_eq!(productive.outcome(), Outcome::Productive);
        assert_eq!(unproductive.outcome(), Outcome::Unproductive);
        assert_eq!(Outcome::Unproductive.label(), "unproductive");
    }

    #[test]
    fn classification_rejects_extra_fields() {
        let raw = r#"{"is_productive": true, "confidence": 0.8, "reason": "asks for status"}"#;
        assert!(serde_json::from_str::<ClassificationResult>(raw).is_err());
    }

    #[test]
    fn result_serializes_to_wire_shape() {
        let result = AssistantResult {
            is_productive: false,
            confidence: 0.25,
            suggested_response: "ok".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_productive"], false);
        assert_eq!(json["confidence"], 0.25);
        assert_eq!(json["suggested_response"], "ok");
    }

    #[test]
    fn confidence_keeps_model_precision_on_the_wire() {
        let classification: ClassificationResult =
            serde_json::from_str(r#"{"is_productive": true, "confidence": 0.87}"#).unwrap();
        let result = PipelineState::new("Qual o status do meu pedido?")
            .with_classification(classification)
            .into_result();

        let body = serde_json::to_string(&result).unwrap();
        assert!(body.contains(r#""confidence":0.87"#), "got {body}");
    }
}
