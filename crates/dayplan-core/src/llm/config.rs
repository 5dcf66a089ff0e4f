use std::time::Duration;

/// Settings for the text-generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Bearer token. `None` makes every generation fail with a
    /// configuration error instead of preventing startup.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL of an OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Upper bound on one generation request.
    pub timeout: Duration,
}

impl LlmConfig {
    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
    pub const MODEL_ENV: &str = "DAYPLAN_MODEL";
    pub const BASE_URL_ENV: &str = "DAYPLAN_LLM_BASE_URL";
    pub const TIMEOUT_ENV: &str = "DAYPLAN_LLM_TIMEOUT_SECS";

    /// URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::DEFAULT_MODEL.to_owned(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}
