//! HTTP surface of the service.
//!
//! Decode the request, validate it, hand the content to
//! the pipeline, map failures onto status codes.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, router};
