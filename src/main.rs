//! E-Learn · Course & Quiz Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional ML microservice integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 5000)
//!   ML_SERVICE_URL     : enables the recommendation/question/tutor collaborator if present
//!   ML_TIMEOUT_SECS    : per-call timeout for the ML client (default 20)
//!   ELEARN_CONFIG_PATH : path to TOML config (prompts + optional content bank)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod store;
mod state;
mod protocol;
mod logic;
mod ml;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (document stores, ML client, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 5000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "elearn_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
