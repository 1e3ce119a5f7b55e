//! HTTP routes.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lexsen_answer::{AnswerError, AnswerOutcome, AnswerPipeline, Turn, cited_sources};
use lexsen_retrieval::DocumentChunk;

use crate::assets::{FLAG_ROUTE, Image};
use crate::page;
use crate::session::{Session, SessionStore, session_id};

/// Shared state for the router.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    pub sessions: SessionStore,
    /// Flag shown beside the title, when one was loaded at startup.
    pub flag: Option<Image>,
}

impl AppState {
    pub fn new(pipeline: AnswerPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sessions: SessionStore::new(),
            flag: None,
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_flag(mut self, flag: Option<Image>) -> Self {
        self.flag = flag;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub outcome: AnswerOutcome,
    pub answer: String,
    /// Chunks cited under the answer; empty unless the outcome is `answered`.
    pub sources: Vec<DocumentChunk>,
    /// Turns this question added to the transcript.
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub turns: Vec<Turn>,
}

/// Build the router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_form_handler))
        .route("/api/ask", post(ask_api_handler))
        .route("/api/transcript", get(transcript_handler))
        .route("/health", get(health_handler))
        .route(FLAG_ROUTE, get(flag_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "chunks": state.pipeline.retriever().store().len(),
    }))
}

async fn flag_handler(State(state): State<AppState>) -> Response {
    match state.flag {
        Some(flag) => ([(CONTENT_TYPE, flag.content_type)], flag.bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Renders the caller's transcript. Sessions are only started by a
/// question, so a first visit gets the empty page and no cookie.
async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let turns = existing_turns(&state, &headers).await;
    Html(page::render(&turns, state.flag.is_some())).into_response()
}

async fn ask_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(request): Form<AskRequest>,
) -> Response {
    let session = state.sessions.get_or_create(session_id(&headers)).await;
    {
        let mut transcript = session.transcript.lock().await;
        // Failures are already recorded in the transcript as an error turn.
        if let Err(err) = state
            .pipeline
            .answer_into(&mut transcript, &request.question)
            .await
        {
            warn!("Question from session {} not answered: {err}", session.id);
        }
    }
    with_session_cookie(&session, Redirect::to("/").into_response())
}

async fn ask_api_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Response {
    let session = state.sessions.get_or_create(session_id(&headers)).await;
    let response = {
        let mut transcript = session.transcript.lock().await;
        let before = transcript.len();
        let result = state
            .pipeline
            .answer_into(&mut transcript, &request.question)
            .await;
        let turns = transcript.render_all()[before..].to_vec();

        match result {
            Ok(result) => {
                info!(
                    "Session {} asked a question: {:?}",
                    session.id, result.outcome
                );
                let sources = if result.outcome.shows_sources() {
                    cited_sources(&result.supporting_chunks).into_iter().cloned().collect()
                } else {
                    Vec::new()
                };
                Json(AskResponse {
                    outcome: result.outcome,
                    answer: result.answer_text,
                    sources,
                    turns,
                })
                .into_response()
            }
            Err(err) => {
                let status = match err {
                    AnswerError::EmptyQuestion => StatusCode::BAD_REQUEST,
                    AnswerError::Retrieval(_) | AnswerError::Completion(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (
                    status,
                    Json(ErrorResponse {
                        error: err.to_string(),
                        turns,
                    }),
                )
                    .into_response()
            }
        }
    };
    with_session_cookie(&session, response)
}

async fn transcript_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let turns = existing_turns(&state, &headers).await;
    Json(TranscriptResponse { turns }).into_response()
}

/// Turns of the live session named by the request's cookie, if any.
async fn existing_turns(state: &AppState, headers: &HeaderMap) -> Vec<Turn> {
    let Some(id) = session_id(headers) else {
        return Vec::new();
    };
    match state.sessions.get(id).await {
        Some(transcript) => transcript.lock().await.render_all().to_vec(),
        None => Vec::new(),
    }
}

fn with_session_cookie(session: &Session, mut response: Response) -> Response {
    if let Some(cookie) = session.set_cookie() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => warn!("Invalid session cookie: {err}"),
        }
    }
    response
}
