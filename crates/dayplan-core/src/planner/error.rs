use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;

use super::parser::ReplyParseError;

/// Why a plan could not be generated or stored.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("text-generation API key is not configured")]
    MissingApiKey,

    #[error("text-generation request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error(transparent)]
    Llm(LlmError),

    #[error(transparent)]
    MalformedReply(#[from] ReplyParseError),

    #[error("failed to store generated plan: {0:#}")]
    Storage(anyhow::Error),
}

impl From<LlmError> for GenerateError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => Self::MissingApiKey,
            other => Self::Llm(other),
        }
    }
}
