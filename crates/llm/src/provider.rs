use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message for the text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Sampling controls for a single completion request. Rule generation
/// runs cold to bias toward deterministic structured output; summaries
/// run warmer.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub nucleus_p: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    pub fn cold(max_tokens: u32) -> Self {
        Self {
            temperature: 0.1,
            nucleus_p: 0.9,
            max_tokens,
        }
    }

    pub fn warm(max_tokens: u32) -> Self {
        Self {
            temperature: 0.7,
            nucleus_p: 0.95,
            max_tokens,
        }
    }
}

/// Trait for text-generation backends — each provider implements this.
/// One request, one non-streamed completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<Message>,
        params: SamplingParams,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} — {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}
