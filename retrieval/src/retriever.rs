//! Question-to-chunks retriever.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use lexsen_embeddings::{EmbeddingProvider, EmbeddingRequest, HttpEmbeddingProvider};

use crate::chunk::RetrievedChunk;
use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::mmr::MmrConfig;
use crate::store::VectorStore;

/// Embeds a question and runs an MMR search over the vector store.
///
/// Built once at startup; the store is shared read-only between requests.
#[derive(Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    mmr: MmrConfig,
}

impl Retriever {
    /// Assemble a retriever from already constructed parts.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
        mmr: MmrConfig,
    ) -> Result<Self> {
        if provider.default_dimension() != store.dimension() {
            return Err(RetrievalError::Config(format!(
                "embedding model {} produces {} dimensions but the index holds {}",
                provider.default_model(),
                provider.default_dimension(),
                store.dimension()
            )));
        }

        if provider.default_model() != store.embedding_model() {
            warn!(
                "Index was built with {} but queries use {}",
                store.embedding_model(),
                provider.default_model()
            );
        }

        Ok(Self {
            provider,
            store,
            mmr,
        })
    }

    /// Load the index and wire the HTTP embedding provider.
    pub async fn from_config(config: &RetrievalConfig) -> Result<Self> {
        let store = VectorStore::load(&config.index_dir, config.load_options()).await?;

        let mut provider = HttpEmbeddingProvider::new(&config.embedding.base_url)
            .with_model(&config.embedding.model, config.embedding.dimension)
            .with_timeout(Duration::from_secs(config.embedding.request_timeout_secs))?;
        if let Some(api_key) = &config.embedding.api_key {
            provider = provider.with_api_key(api_key);
        }

        info!(
            "Retriever ready: {} chunks, k={}, fetch_k={}, lambda={}",
            store.len(),
            config.mmr.k,
            config.mmr.fetch_k,
            config.mmr.lambda
        );

        Self::new(Arc::new(provider), Arc::new(store), config.mmr)
    }

    /// Retrieve the chunks that best answer `question`.
    ///
    /// An empty index returns no chunks without contacting the provider.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if self.store.is_empty() {
            warn!("Vector index is empty; answering without context");
            return Ok(Vec::new());
        }

        let response = self
            .provider
            .embed(EmbeddingRequest::new(question))
            .await?;

        let chunks = self
            .store
            .max_marginal_relevance_search(&response.embedding, &self.mmr)?;

        debug!("Retrieved {} chunks for question", chunks.len());
        Ok(chunks)
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn mmr(&self) -> &MmrConfig {
        &self.mmr
    }
}
