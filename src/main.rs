mod analysis;
mod builder;
mod catalog;
mod config;
mod error;
mod llm;
mod rate_limit;
mod routes;
mod sandbox;
mod services;
mod state;

use std::sync::Arc;

use config::{ServerConfig, TurnConfig};
use rate_limit::RateLimiter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let server = ServerConfig::from_env();
    let turn = TurnConfig::from_env();

    // Initialize LLM client (non-fatal: turn endpoints answer E_LLM_NOT_CONFIGURED).
    let llm: Option<Arc<dyn llm::LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; site generation disabled");
            None
        }
    };

    tracing::info!(
        max_tokens = turn.max_tokens,
        timeout_secs = turn.timeout.as_secs(),
        history_limit = ?turn.history_limit,
        "turn config loaded"
    );

    let state = state::AppState::new(llm, turn, RateLimiter::new());
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = server.port, "vibefolio listening");
    axum::serve(listener, app).await.expect("server failed");
}
