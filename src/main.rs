use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cardio_risk::server::{AppState, build_router};
use cardio_risk::{Predictor, ServiceConfig};
use log::info;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::load(std::env::args().nth(1).map(PathBuf::from))
        .context("failed to load configuration")?;

    info!("Loading classifier from {}", config.model_path.display());
    let predictor = Predictor::from_config(&config).context("failed to initialise predictor")?;

    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config, predictor));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
