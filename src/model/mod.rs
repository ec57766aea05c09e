//! Generative model access for selector generation

pub mod client;
pub mod prompt;
pub mod types;

pub use client::{Endpoint, GeminiClient, SelectorModel, DEFAULT_RETRY_AFTER};
pub use prompt::{parse_answer, selector_prompt, ModelAnswer, ERROR_PREFIX};
pub use types::{GenerateContentRequest, GenerateContentResponse};
