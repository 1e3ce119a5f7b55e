//! The retrieve / prompt / generate pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use lexsen_retrieval::{DocumentChunk, RetrievalConfig, Retriever};

use crate::citation::{AnswerOutcome, format_sources};
use crate::completion::{CompletionProvider, CompletionRequest, GroqProvider};
use crate::config::CompletionConfig;
use crate::error::{AnswerError, CompletionError, Result};
use crate::prompt::PromptTemplate;
use crate::transcript::{Role, Transcript};

/// Assistant turn appended when a question could not be answered.
pub const ERROR_TURN: &str =
    "Une erreur est survenue lors de la recherche juridique. Veuillez réessayer.";

/// Result of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Text of the model's answer.
    pub answer_text: String,

    /// Chunks given to the model, in retrieval order.
    pub supporting_chunks: Vec<DocumentChunk>,

    /// How the answer was classified.
    pub outcome: AnswerOutcome,
}

/// Answers questions against the legal index.
///
/// Built once at startup and shared by every session; nothing in it is
/// mutated after construction.
pub struct AnswerPipeline {
    retriever: Retriever,
    completion: Arc<dyn CompletionProvider>,
    prompt: PromptTemplate,
    model: String,
    temperature: f32,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Retriever,
        completion: Arc<dyn CompletionProvider>,
        config: &CompletionConfig,
    ) -> Self {
        Self {
            retriever,
            completion,
            prompt: PromptTemplate::legal_assistant(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Load the index and wire both HTTP providers.
    ///
    /// Fails when the index cannot be loaded or the completion API key is
    /// missing.
    pub async fn from_config(
        retrieval: &RetrievalConfig,
        completion: &CompletionConfig,
    ) -> Result<Self> {
        let provider = GroqProvider::from_config(completion)?;
        if !provider.is_available() {
            return Err(CompletionError::ProviderNotConfigured.into());
        }

        let retriever = Retriever::from_config(retrieval).await?;
        info!(
            "Answer pipeline ready: model {} at temperature {}",
            completion.model, completion.temperature
        );

        Ok(Self::new(retriever, Arc::new(provider), completion))
    }

    /// Replace the prompt template.
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer one question.
    ///
    /// Retrieval and generation failures are returned as-is; nothing is
    /// retried.
    pub async fn ask(&self, question: &str) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let supporting_chunks: Vec<DocumentChunk> = self
            .retriever
            .retrieve(question)
            .await?
            .into_iter()
            .map(|retrieved| retrieved.chunk)
            .collect();

        let prompt = self.prompt.render(&supporting_chunks, question);
        debug!(
            "Prompt built from {} chunks ({} chars)",
            supporting_chunks.len(),
            prompt.len()
        );

        let response = self
            .completion
            .complete(CompletionRequest::single_prompt(
                &self.model,
                prompt,
                self.temperature,
            ))
            .await?;

        let outcome = AnswerOutcome::classify(question, &response.content);
        info!("Answered question: {outcome:?}");

        Ok(AnswerResult {
            answer_text: response.content,
            supporting_chunks,
            outcome,
        })
    }

    /// Answer `question` and record the exchange in `transcript`.
    ///
    /// Appends the question, then the answer, then a citation turn when the
    /// outcome is [`AnswerOutcome::Answered`]. If the pipeline fails, an
    /// [`ERROR_TURN`] follows the question instead and the error is
    /// returned. An empty question is rejected before anything is appended.
    pub async fn answer_into(
        &self,
        transcript: &mut Transcript,
        question: &str,
    ) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        transcript.append_turn(Role::User, question);

        match self.ask(question).await {
            Ok(result) => {
                transcript.append_turn(Role::Assistant, result.answer_text.as_str());
                if result.outcome.shows_sources() {
                    transcript.append_turn(
                        Role::Assistant,
                        format_sources(&result.supporting_chunks),
                    );
                }
                Ok(result)
            }
            Err(err) => {
                error!("Failed to answer question: {err}");
                transcript.append_turn(Role::Assistant, ERROR_TURN);
                Err(err)
            }
        }
    }
}
