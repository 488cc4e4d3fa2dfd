//! Email Assistant: classifies inbound emails and drafts replies.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod llm;
pub mod pipeline;
