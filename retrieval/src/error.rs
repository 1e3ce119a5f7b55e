//! Error types for the retrieval layer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while loading or querying the vector store.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] lexsen_embeddings::EmbeddingError),

    /// No index at the configured location.
    #[error("vector index not found at {}", .0.display())]
    IndexNotFound(PathBuf),

    /// The manifest was written by an incompatible version.
    #[error("unsupported index format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    /// The entries file does not match the manifest checksum.
    #[error("index checksum mismatch: manifest says {expected}, entries hash to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The manifest carries no checksum and unverified loading is not allowed.
    #[error("index at {} has no checksum; set allow_unverified to load it anyway", .0.display())]
    UnverifiedIndex(PathBuf),

    /// The index content is internally inconsistent.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
