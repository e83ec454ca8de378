//! Adaptive Quiz Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional OpenAI integration (via environment variables)
//! - Local question bank from the TOML config otherwise
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   OPENAI_API_KEY   : enables OpenAI integration if present
//!   OPENAI_BASE_URL  : default "https://api.openai.com/v1"
//!   OPENAI_MODEL     : default "gpt-4o-mini"
//!   QUIZ_CONFIG_PATH : path to TOML config (prompts, quiz settings, question bank)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use adaptive_quiz_backend::routes::build_router;
use adaptive_quiz_backend::state::AppState;
use adaptive_quiz_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: session store, content provider, quiz settings.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quiz_backend", %addr, provider = state.provider.name(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
