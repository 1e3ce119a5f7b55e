//! Error types for the answer pipeline.

use thiserror::Error;

/// Result type alias for answer operations.
pub type Result<T> = std::result::Result<T, AnswerError>;

/// Errors that abort a question.
#[derive(Error, Debug)]
pub enum AnswerError {
    /// The question is empty after trimming.
    #[error("question is empty")]
    EmptyQuestion,

    /// Index lookup or query embedding failed.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] lexsen_retrieval::RetrievalError),

    /// The completion provider failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
}

/// Completion-provider errors.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// No API key configured.
    #[error("completion provider not configured")]
    ProviderNotConfigured,

    /// The provider rejected the credentials.
    #[error("completion provider rejected the API key")]
    Unauthorized,

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
