//! # Embeddings
//!
//! This crate turns text into dense vectors for LexSen retrieval and
//! provides the vector math used by the index.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert questions to vectors through an
//!   OpenAI-compatible `/embeddings` endpoint
//! - **Similarity**: Cosine similarity, normalization and top-k ranking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► similarity                 │
//! │       │                                  │                      │
//! │       ▼                                  ▼                      │
//! │  HttpEmbeddingProvider            cosine / top-k                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HttpEmbeddingProvider};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default embedding model, served by any OpenAI-compatible endpoint.
pub const DEFAULT_MODEL: &str = "Alibaba-NLP/gte-multilingual-base";

/// Dimension of [`DEFAULT_MODEL`] vectors.
pub const DEFAULT_DIMENSION: usize = 768;
