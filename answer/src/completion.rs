//! Chat-completion providers.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CompletionConfig;
use crate::error::CompletionError;

/// Chat message role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,

    /// Conversation sent to the model.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// A request carrying `prompt` as the single user message.
    pub fn single_prompt(
        model: impl Into<String>,
        prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        }
    }
}

/// Completion text with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Text of the top choice.
    pub content: String,

    /// Model reported by the provider.
    pub model: String,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for text-generation providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate a completion. Failures are returned as-is; nothing is retried.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Groq chat-completion provider (OpenAI wire format).
pub struct GroqProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl GroqProvider {
    /// Create a provider for the default Groq endpoint.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: crate::config::DEFAULT_COMPLETION_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider from configuration.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let mut provider = Self::new()
            .with_base_url(&config.base_url)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))?;
        if let Some(key) = &config.api_key {
            provider = provider.with_api_key(key);
        }
        Ok(provider)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, CompletionError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

impl Default for GroqProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(CompletionError::ProviderNotConfigured)?;

        debug!(
            "Requesting completion from {} with model {} ({} messages)",
            self.base_url,
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CompletionError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(CompletionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::ApiRequest(format!("{status}: {error_text}")));
        }

        let result: WireCompletionResponse = response.json().await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::InvalidResponse("No completion in response".to_string())
            })?;

        let tokens_used = result.usage.map(|u| u.total_tokens);
        info!(
            "Completion received: {} chars, {} tokens",
            content.len(),
            tokens_used.map_or_else(|| "?".to_string(), |t| t.to_string())
        );

        Ok(CompletionResponse {
            content,
            model: result.model.unwrap_or(request.model),
            tokens_used,
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI-style response format.
#[derive(Debug, Deserialize)]
struct WireCompletionResponse {
    choices: Vec<WireChoice>,
    model: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    total_tokens: u64,
}
