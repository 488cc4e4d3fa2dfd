//! Email processing pipeline.
//!
//! Every email that passes input validation flows through:
//! 1. `Classifier::classify()`: LLM call with a structured JSON answer
//! 2. `Outcome` branch: the only decision point
//! 3. `Responder::respond()`: LLM-drafted reply, or the canned notice
//!
//! `EmailPipeline` wires the stages together.

pub mod classifier;
pub mod processor;
pub mod responder;
pub mod types;

pub use processor::EmailPipeline;
pub use responder::DEFAULT_UNPRODUCTIVE_RESPONSE;
pub use types::{AssistantResult, ClassificationResult, Outcome, PipelineState};
