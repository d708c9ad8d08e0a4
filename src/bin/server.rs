//! eqcoach HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `EQCOACH_CONFIG` — Optional YAML engine config
//! - `EQCOACH_MIN_SCORE`, `EQCOACH_MAX_ATTEMPTS`, ... — Config overrides
//! - `EQCOACH_LLM_API_KEY` — Enables the chat-completion collaborators
//! - `EQCOACH_LLM_BASE_URL`, `EQCOACH_LLM_MODEL` — Endpoint and model
//! - `RUST_LOG` — Tracing filter (default: "info,eqcoach=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use eqcoach::collaborators::http::ChatCompletionClient;
use eqcoach::config::EngineConfig;
use eqcoach::engine::{CoachingEngine, Collaborators};
use eqcoach::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eqcoach=debug".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let config = EngineConfig::load().context("invalid engine configuration")?;

    let collaborators = match ChatCompletionClient::from_env() {
        Some(client) => {
            tracing::info!("LLM collaborators enabled");
            let client = Arc::new(client);
            Collaborators::default()
                .with_generator(client.clone())
                .with_refiner(client.clone())
                .with_rewriter(client)
        }
        None => {
            tracing::warn!("EQCOACH_LLM_API_KEY not set; running keyword-only without rewriter");
            Collaborators::default()
        }
    };

    let engine = CoachingEngine::new(config, collaborators)?;
    let app = app_router(AppState::new(engine));

    tracing::info!("eqcoach server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  — liveness check");
    tracing::info!("  POST /sessions                — start a session");
    tracing::info!("  POST /sessions/:id/turns      — advance one turn");
    tracing::info!("  POST /sessions/:id/replies    — gate a coach reply");
    tracing::info!("  GET  /sessions/:id/transcript — transcript");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
