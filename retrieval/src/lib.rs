//! # Retrieval
//!
//! Loads the prebuilt vector index of Senegalese legal texts and selects the
//! chunks used as context for an answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Retrieval                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  question ──► EmbeddingProvider ──► query vector                │
//! │                                          │                      │
//! │                                          ▼                      │
//! │  index dir ──► VectorStore ──► top fetch_k ──► MMR ──► k chunks │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexsen_retrieval::{RetrievalConfig, Retriever};
//!
//! let retriever = Retriever::from_config(&RetrievalConfig::new("index")).await?;
//! let chunks = retriever.retrieve("Quel est l'âge légal du mariage ?").await?;
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod mmr;
pub mod retriever;
pub mod store;

pub use chunk::{ChunkMetadata, DocumentChunk, RetrievedChunk};
pub use config::{EmbeddingConfig, RetrievalConfig};
pub use error::{Result, RetrievalError};
pub use mmr::{MmrConfig, mmr_select};
pub use retriever::Retriever;
pub use store::{IndexManifest, LoadOptions, StoredEntry, VectorStore};

// Re-export from dependencies for convenience
pub use lexsen_embeddings::{EmbeddingProvider, HttpEmbeddingProvider};
