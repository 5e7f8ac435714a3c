use anyhow::{Context, Result};
use clap::Parser;
use offcharts_game::Gateway;
use offcharts_server::{AppState, OpenAiGenerator, ServerConfig, app};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = ServerConfig::parse();

    if config.api_key().is_none() {
        log::warn!("OPENAI_API_KEY is not set; scoring and appeals will fail until it is");
    }
    let generator =
        OpenAiGenerator::from_config(&config).context("failed to build model client")?;
    log::info!("grading with model {}", generator.model());

    let state = AppState::new(Arc::new(Gateway::new(generator)));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    log::info!("listening on {}", config.bind);

    axum::serve(listener, app(state))
        .await
        .context("server terminated")?;
    Ok(())
}
