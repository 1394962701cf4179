//! LLM enrichment for axioms
//!
//! This crate provides:
//! - The [`ChatModel`] seam a language model is plugged in through
//! - Batched enrichment of axioms with violation descriptions and
//!   inferred postconditions
//! - A file cache for model responses
//!
//! No client ships here; callers supply their own [`ChatModel`].

mod cache;
mod enricher;
mod prompts;
mod types;

pub use cache::{CachedModel, ResponseCache};
pub use enricher::{group_by_function, parse_enrichment_response, EnrichConfig, Enricher, DEFAULT_BATCH_SIZE, GLOBAL_GROUP};
pub use prompts::build_enrichment_prompt;
pub use types::*;

/// Error type for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Model call failed: {0}")]
    Model(String),
    #[error("No response from LLM")]
    NoResponse,
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown axiom type in response: {0}")]
    UnknownAxiomType(String),
    #[error("Cache error at {path}: {source}")]
    Cache {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache entry is not valid JSON: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

/// A language model that answers a single prompt
pub trait ChatModel {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<M: ChatModel + ?Sized> ChatModel for &M {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt)
    }
}

/// The TOML body of a response, without fences or leading chatter
pub fn extract_toml(response: &str) -> &str {
    if let Some(start) = response.find("```toml") {
        let body = &response[start + 7..];
        return body.find("```").map_or(body, |end| &body[..end]);
    }
    if let Some(start) = response.find("```") {
        let after_backticks = &response[start + 3..];
        // Skip optional language identifier
        let code_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        let code = &after_backticks[code_start..];
        return code.find("```").map_or(code, |end| &code[..end]);
    }
    match response.find("[[axioms]]") {
        Some(start) => &response[start..],
        None => response,
    }
}
