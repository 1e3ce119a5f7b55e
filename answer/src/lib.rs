//! # Answer
//!
//! Turns a legal question into an answer grounded in the indexed texts, and
//! keeps the per-session transcript that the web UI renders.
//!
//! ## Flow
//!
//! ```text
//! question ──► Retriever (MMR, k=2) ──► PromptTemplate ──► CompletionProvider
//!                                                              │
//!                       Transcript ◄── citation turn ◄── AnswerOutcome
//! ```
//!
//! A citation turn is added only for [`AnswerOutcome::Answered`]. Greetings
//! and answers that use the fallback sentence are shown without sources.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexsen_answer::{AnswerPipeline, CompletionConfig, Transcript};
//! use lexsen_retrieval::RetrievalConfig;
//!
//! let pipeline = AnswerPipeline::from_config(
//!     &RetrievalConfig::new("index"),
//!     &CompletionConfig::default().with_api_key(api_key),
//! )
//! .await?;
//!
//! let mut transcript = Transcript::new();
//! pipeline.answer_into(&mut transcript, "Qu'est-ce que le lévirat ?").await?;
//! ```

pub mod citation;
pub mod completion;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod transcript;

pub use citation::{
    AnswerOutcome, FALLBACK_EN, FALLBACK_FR, GREETINGS, MAX_SOURCES, SOURCES_HEADER, cited_sources,
    format_sources, should_show_sources, source_label,
};
pub use completion::{
    ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse, GroqProvider,
    MessageRole,
};
pub use config::{CompletionConfig, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_URL};
pub use error::{AnswerError, CompletionError, Result};
pub use pipeline::{AnswerPipeline, AnswerResult, ERROR_TURN};
pub use prompt::PromptTemplate;
pub use transcript::{Role, Transcript, Turn};
