//! HTTP server entry point.
//!
//! Loads configuration from the environment, wires the OpenAI-backed agents
//! into the shared state and serves the nutrition API until Ctrl-C.

mod dto;
mod error;
mod handlers;
mod router;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use zcal_agents::{FoodIdentifier, FoodIdentifierAgent, RecipeAssistant, RecipeGeneratorAgent};
use zcal_config::AppConfig;
use zcal_llm::{ChatProvider, OpenAiProvider};

/// Shared server state accessible from all handlers.
pub struct ServerState {
    pub food_agent: Arc<dyn FoodIdentifier>,
    pub recipe_agent: Arc<dyn RecipeAssistant>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let state = Arc::new(init_server_state(&config)?);
    let app = router::build_router(state);

    let addr = config.listen_addr();
    info!("Starting server on {}", addr);
    info!("  - GET  /health");
    info!("  - POST /api/identify-food");
    info!("  - POST /api/generate-recipe");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Builds the provider and both agents from configuration.
fn init_server_state(config: &AppConfig) -> Result<ServerState> {
    let provider: Arc<dyn ChatProvider> = Arc::new(OpenAiProvider::new(
        &config.api_key,
        &config.model,
        config.api_base.as_deref(),
    )?);
    info!("Using model {}", config.model);
    if let Some(base) = &config.api_base {
        info!("Using API base {}", base);
    }

    let food_agent = FoodIdentifierAgent::new(Arc::clone(&provider))
        .with_max_image_mb(config.max_image_mb);
    let recipe_agent = RecipeGeneratorAgent::new(provider);

    Ok(ServerState {
        food_agent: Arc::new(food_agent),
        recipe_agent: Arc::new(recipe_agent),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
