use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use kafkaviz_api_server::AppState;
use kafkaviz_engine::Engine;

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;

const API_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("kafkaviz-server starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    let port = args.port.unwrap_or(config.api_port);
    tracing::info!(config = %args.config, port, "loaded config");

    // --- Engine + tutor ---
    let engine = Arc::new(Engine::bootstrap(config.simulation)?);
    let tutor = kafkaviz_tutor::from_config(&config.tutor);

    let token = CancellationToken::new();

    // --- API server ---
    let state = AppState {
        engine: engine.clone(),
        tutor,
    };
    let api_token = token.clone();
    let mut api_handle = tokio::spawn(async move {
        if let Err(e) = kafkaviz_api_server::run(port, state, api_token).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    tracing::info!("server ready");

    // --- Wait for Ctrl+C or an early API exit ---
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = &mut api_handle => {
            tracing::warn!("api server exited");
        }
    }
    tracing::info!("shutting down...");

    token.cancel();
    engine.shutdown().await;

    if !api_handle.is_finished()
        && tokio::time::timeout(API_DRAIN_TIMEOUT, &mut api_handle).await.is_err()
    {
        api_handle.abort();
    }

    tracing::info!("shutdown complete");
    Ok(())
}
