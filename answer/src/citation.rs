//! Answer classification and source citations.
//!
//! Sources are listed under an answer only when the answer actually draws on
//! the retrieved texts: not when the model used the fallback sentence, and
//! not when the user merely greeted it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use lexsen_retrieval::DocumentChunk;

/// Sentence the model is told to use when the extracts do not answer.
pub const FALLBACK_FR: &str =
    "Je suis désolé, mais aucun extrait de document en ma possession ne semble contenir une réponse claire à cette question.";

/// English form of [`FALLBACK_FR`].
pub const FALLBACK_EN: &str =
    "I'm sorry, but none of the excerpts in my possession appear to contain a clear answer to this question.";

/// Questions treated as greetings (compared trimmed and lower-cased).
pub const GREETINGS: [&str; 6] = ["bonjour", "salut", "bonsoir", "hello", "hi", "hey"];

/// First line of a citation turn.
pub const SOURCES_HEADER: &str = "🔎 Sources utilisées :";

/// Most sources listed under one answer.
pub const MAX_SOURCES: usize = 2;

/// What kind of answer the pipeline produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// A substantive answer drawn from the extracts.
    Answered,
    /// The model reported that the extracts do not answer the question.
    NoContextFound,
    /// The question was a greeting.
    Greeting,
}

impl AnswerOutcome {
    /// Classify a finished exchange.
    ///
    /// The fallback check runs first, so a greeting answered with the
    /// fallback sentence is `NoContextFound`.
    pub fn classify(question: &str, answer_text: &str) -> Self {
        if is_fallback_answer(answer_text) {
            Self::NoContextFound
        } else if is_greeting(question) {
            Self::Greeting
        } else {
            Self::Answered
        }
    }

    /// Whether a citation turn follows this answer.
    pub fn shows_sources(self) -> bool {
        self == Self::Answered
    }
}

/// Whether `answer_text` contains either fallback sentence, ignoring case.
pub fn is_fallback_answer(answer_text: &str) -> bool {
    let answer = answer_text.to_lowercase();
    [FALLBACK_FR, FALLBACK_EN]
        .iter()
        .any(|sentence| answer.contains(&sentence.to_lowercase()))
}

/// Whether the whole question is one greeting word.
pub fn is_greeting(question: &str) -> bool {
    let question = question.trim().to_lowercase();
    GREETINGS.contains(&question.as_str())
}

/// Whether sources should be listed after `answer_text`.
pub fn should_show_sources(question: &str, answer_text: &str) -> bool {
    AnswerOutcome::classify(question, answer_text).shows_sources()
}

/// Label line for one chunk.
pub fn source_label(chunk: &DocumentChunk) -> String {
    let meta = &chunk.metadata;
    let folder = meta.folder.as_deref().unwrap_or("Sans dossier");
    let title = meta.chunk_title.as_deref().unwrap_or("Sans titre");
    let document = meta.document_title.as_deref().unwrap_or("Document inconnu");
    let url = meta.source_url.as_deref().unwrap_or_default();
    format!("📚 {folder} / {document} / {title}\n→ {url}")
}

/// Chunks cited for an answer, in retrieval order.
///
/// Duplicates (same [`DocumentChunk::identity`]) are kept once and at most
/// [`MAX_SOURCES`] chunks are returned.
pub fn cited_sources(chunks: &[DocumentChunk]) -> Vec<&DocumentChunk> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|chunk| seen.insert(chunk.identity()))
        .take(MAX_SOURCES)
        .collect()
}

/// Citation turn text for the [`cited_sources`] of `chunks`.
///
/// With no chunks only the header remains.
pub fn format_sources(chunks: &[DocumentChunk]) -> String {
    let labels: Vec<String> = cited_sources(chunks).into_iter().map(source_label).collect();

    format!("{SOURCES_HEADER}\n\n{}", labels.join("\n\n"))
}
