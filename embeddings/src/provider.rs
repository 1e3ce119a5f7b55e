//! Embedding providers.
//!
//! The index is built offline with a sentence-embedding model; at query time
//! the same model is reached through an OpenAI-compatible HTTP endpoint
//! (text-embeddings-inference, vLLM, a hosted gateway, ...).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::similarity::normalize;
use crate::{DEFAULT_DIMENSION, DEFAULT_MODEL, Embedding};

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is usable (endpoint configured, etc.).
    fn is_available(&self) -> bool;
}

/// Embedding provider speaking the OpenAI `/embeddings` wire format.
pub struct HttpEmbeddingProvider {
    /// API key, if the endpoint requires one.
    api_key: Option<String>,

    /// API base URL, without the `/embeddings` suffix.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Expected output dimension.
    dimension: usize,
}

impl HttpEmbeddingProvider {
    /// Create a provider for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            default_model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the default model and its output dimension.
    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.default_model = model.into();
        self.dimension = dimension;
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        if !self.is_available() {
            return Err(EmbeddingError::ProviderNotConfigured);
        }
        if request.text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        debug!("Generating embedding with model: {model}");

        let body = serde_json::json!({
            "input": request.text,
            "model": model
        });

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let result: WireEmbeddingResponse = response.json().await?;

        let mut embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))?
            .embedding;

        if embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "Empty embedding vector".to_string(),
            ));
        }

        normalize(&mut embedding);

        let dimension = embedding.len();
        let tokens_used = result.usage.map(|u| u.total_tokens);

        debug!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model: result.model.unwrap_or(model),
            dimension,
            tokens_used,
        })
    }

    fn is_available(&self) -> bool {
        !self.base_url.is_empty()
    }
}

/// OpenAI-compatible response format.
#[derive(Debug, Deserialize)]
struct WireEmbeddingResponse {
    data: Vec<WireEmbeddingData>,
    model: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Code de la famille").with_model("gte");

        assert_eq!(request.text, "Code de la famille");
        assert_eq!(request.model, Some("gte".to_string()));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider = HttpEmbeddingProvider::new("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
        assert_eq!(provider.default_dimension(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_embed_normalizes_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "input": "divorce",
                "model": "gte"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [3.0, 4.0], "index": 0 }],
                "model": "gte",
                "usage": { "prompt_tokens": 2, "total_tokens": 2 }
            })))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(server.uri())
            .with_api_key("secret")
            .with_model("gte", 2);
        let response = provider.embed(EmbeddingRequest::new("divorce")).await.unwrap();

        assert_eq!(response.dimension, 2);
        assert_eq!(response.model, "gte");
        assert_eq!(response.tokens_used, Some(2));
        assert!((response.embedding[0] - 0.6).abs() < 1e-6);
        assert!((response.embedding[1] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embed_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(server.uri());
        let err = provider
            .embed(EmbeddingRequest::new("salaire minimum"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_missing_data_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(server.uri());
        let err = provider
            .embed(EmbeddingRequest::new("bail"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_embed_rejects_blank_text() {
        let provider = HttpEmbeddingProvider::new("http://127.0.0.1:9");
        let err = provider.embed(EmbeddingRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let provider = HttpEmbeddingProvider::new("");
        assert!(!provider.is_available());

        let err = provider.embed(EmbeddingRequest::new("loi")).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
    }
}
