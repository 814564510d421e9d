//! leadflow server.
//!
//! Reads configuration from `LEADFLOW__*` environment variables (and `.env`),
//! wires the in-memory stores, the enrichment provider and the mock
//! generator, and serves the HTTP API until Ctrl-C.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use leadflow::adapters::ai::MockAIProvider;
use leadflow::adapters::enrichment::{HttpEnrichmentProvider, MockEnrichmentProvider};
use leadflow::adapters::http::{app_router, AppState, StateSettings};
use leadflow::config::AppConfig;
use leadflow::ports::EnrichmentProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let enrichment: Arc<dyn EnrichmentProvider> = match config.enrichment.http_config() {
        Some(http) => {
            tracing::info!(base_url = %http.base_url, "Using HTTP enrichment provider");
            Arc::new(HttpEnrichmentProvider::new(http)?)
        }
        None => {
            tracing::warn!("No enrichment base_url configured, using mock research");
            Arc::new(MockEnrichmentProvider::new())
        }
    };
    let ai_provider = Arc::new(MockAIProvider::new().with_model(config.ai.model.clone()));

    let state = AppState::in_memory(
        ai_provider,
        enrichment,
        StateSettings {
            enrichment_wait: config.enrichment.wait_timeout(),
            chat: config.ai.stream_chat_config(),
        },
    );
    let coordinator = state.coordinator.clone();
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "leadflow listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pending = coordinator.len();
    coordinator.shutdown();
    tracing::info!(pending_research = pending, "Shut down");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
