use prompt_relay::client::OpenAiClient;
use prompt_relay::config::RelayConfig;
use prompt_relay::relay::{self, AppState};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::load()?;
    config.validate()?;

    info!("Starting prompt relay");
    info!("  Listen: {}", config.server.listen_addr);
    info!("  Upstream: {}", config.openai.endpoint);
    info!("  Model: {}", config.openai.model);

    let provider = Arc::new(OpenAiClient::new(config.openai.clone())?);
    let state = Arc::new(AppState { provider });

    let app = relay::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    info!("Relay ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown handler: {}", e);
    }
}
