//! Quiz Engine · Question Selection Backend
//!
//! - Axum HTTP API serving quiz questions from categorized CSV banks
//! - Level/domain filtering with full relaxation when too few questions match
//! - Cooldown-based anti-repetition with session-seeded draws
//! - One-shot process-call mode: `quiz-engine-backend '<json config>'`
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   QUIZ_CONFIG_PATH   : path to TOML engine config (categories, bounds, cooldown)
//!   QUIZ_DATA_DIR      : directory with the category CSV files (default "data")
//!   QUIZ_HISTORY_PATH  : JSONL file for quiz results; log-only when unset
//!   STATIC_DIR         : frontend directory (default "./static")
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod clock;
mod config;
mod domain;
mod error;
mod filter;
mod history;
mod logic;
mod protocol;
mod recency;
mod routes;
mod selector;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::from_env());

  // A JSON argument means process-call mode: answer once on stdout and exit.
  if let Some(payload) = std::env::args().nth(1) {
    let reply = logic::process_call(&state, &payload);
    println!("{}", reply);
    return Ok(());
  }

  let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".into());
  let app = build_router(state.clone(), &static_dir);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quiz_backend", %addr, %static_dir, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quiz_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "quiz_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
