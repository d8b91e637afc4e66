//! Text model access and the multi-facet transcript analysis built on it.

mod analyzer;
mod client;
pub mod parse;

pub use analyzer::{AnalysisRequest, Analyzer, Facet};
pub use client::ChatCompletionsModel;

use crate::error::Result;

/// Anything that turns a prompt into generated text
pub trait TextModel {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Rate limit reached, try again in a moment: {0}")]
    RateLimited(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("API key rejected: {0}")]
    Auth(String),

    #[error("Model request failed: {0}")]
    Other(String),
}

impl ModelError {
    /// Classify a failed model call from its HTTP status and body
    pub fn classify(status: Option<u16>, body: &str) -> Self {
        let lower = body.to_lowercase();
        let detail = body.trim().to_string();
        if lower.contains("quota") {
            ModelError::QuotaExceeded(detail)
        } else if status == Some(429)
            || lower.contains("rate limit")
            || lower.contains("too many requests")
        {
            ModelError::RateLimited(detail)
        } else if matches!(status, Some(401) | Some(403))
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission")
        {
            ModelError::Auth(detail)
        } else {
            ModelError::Other(detail)
        }
    }
}
