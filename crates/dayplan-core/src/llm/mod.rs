//! Text-generation backends.
//!
//! The planner only needs "send a prompt pair, get JSON-shaped text back".
//! [`TextGenerator`] is that seam: [`OpenAiClient`] talks to an
//! OpenAI-compatible chat-completions endpoint, tests plug in stubs.

pub mod config;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use config::LlmConfig;
pub use openai::OpenAiClient;

/// One single-turn completion request. No conversation state is carried
/// between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Failures talking to a text-generation backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("text-generation API key is not configured")]
    MissingApiKey,

    #[error("text-generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("text-generation API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text-generation API returned an unexpected response: {0}")]
    Decode(String),

    #[error("text-generation API returned no content")]
    EmptyReply,
}

/// Adapter interface for text-generation services.
///
/// Object-safe so the planner can hold it as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Send one request and return the raw text of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};
