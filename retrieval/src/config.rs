//! Configuration for the retriever.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mmr::MmrConfig;
use crate::store::LoadOptions;

/// Configuration for loading the index and querying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Index directory.
    pub index_dir: PathBuf,

    /// Accept an index whose checksum cannot be verified.
    pub allow_unverified: bool,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// MMR search parameters.
    pub mmr: MmrConfig,
}

impl RetrievalConfig {
    /// Create a new configuration with default values.
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            allow_unverified: false,
            embedding: EmbeddingConfig::default(),
            mmr: MmrConfig::default(),
        }
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Set the MMR parameters.
    pub fn with_mmr(mut self, config: MmrConfig) -> Self {
        self.mmr = config;
        self
    }

    /// Accept unverifiable indexes.
    pub fn allow_unverified(mut self) -> Self {
        self.allow_unverified = true;
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            allow_unverified: self.allow_unverified,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new("index")
    }
}

/// Configuration for the query embedding endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible base URL (the `/embeddings` path is appended).
    pub base_url: String,

    /// Model name sent with each request.
    pub model: String,

    /// Output dimension of `model`.
    pub dimension: usize,

    /// Bearer token, if the endpoint needs one.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            model: lexsen_embeddings::DEFAULT_MODEL.to_string(),
            dimension: lexsen_embeddings::DEFAULT_DIMENSION,
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}
