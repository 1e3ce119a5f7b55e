use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lexsen_app_server::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = AppConfig::load().context("invalid configuration")?;

    lexsen_app_server::run(config, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    })
    .await
}
