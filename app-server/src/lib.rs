//! Web front end for the LexSen legal assistant.
//!
//! Serves a single chat page plus a small JSON API. Every browser session
//! gets its own transcript; the answer pipeline and its index are built
//! once at startup and shared by all sessions.

pub mod assets;
pub mod config;
pub mod page;
pub mod routes;
pub mod session;

use std::future::Future;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use lexsen_answer::AnswerPipeline;

pub use assets::{FLAG_ROUTE, Image, load_image};
pub use config::{AppConfig, ConfigError};
pub use routes::{AppState, build_router};
pub use session::{DEFAULT_SESSION_TTL, SESSION_COOKIE, SessionStore};

/// Build the pipeline, bind the listener and serve until `shutdown`
/// resolves.
pub async fn run<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let pipeline = AnswerPipeline::from_config(&config.retrieval, &config.completion)
        .await
        .with_context(|| {
            format!(
                "failed to load the legal index from {}",
                config.retrieval.index_dir.display()
            )
        })?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let state = AppState::new(pipeline)
        .with_sessions(SessionStore::with_ttl(config.session_ttl()))
        .with_flag(load_image(&config.flag_image).await);

    serve(listener, state, shutdown).await
}

/// Serve the router on an already bound listener.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("LexSen listening on http://{addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    info!("LexSen stopped");
    Ok(())
}
