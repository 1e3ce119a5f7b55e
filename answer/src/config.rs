//! Configuration for answer generation.

use serde::{Deserialize, Serialize};

/// Default chat-completion endpoint.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1";

/// Default generation model.
pub const DEFAULT_COMPLETION_MODEL: &str = "llama-3.3-70b-versatile";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Configuration for the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// OpenAI-compatible base URL (the `/chat/completions` path is appended).
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Bearer token. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl CompletionConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}
