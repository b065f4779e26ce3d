//! # split-api
//!
//! HTTP shell for Bill Splitter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        split-api Layers                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  routes/   axum handlers, one module per feature                 │  │
//! │  │            bills · splits · forms · flow · expenses · health      │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │                                      │
//! │  ┌──────────────┐  ┌─────────────┴─────┐  ┌──────────────────────────┐ │
//! │  │  auth.rs     │  │  state/           │  │  error.rs                │ │
//! │  │  Session     │  │  AppState         │  │  ApiError → HTTP status  │ │
//! │  │  extractor   │  │  FlowSessions     │  │  + { code, message }     │ │
//! │  └──────────────┘  └─────────┬─────────┘  └──────────────────────────┘ │
//! │                              │                                          │
//! │          ┌───────────────────┴───────────────────┐                      │
//! │          ▼                                       ▼                      │
//! │  ┌──────────────────┐                  ┌──────────────────┐            │
//! │  │  splitter-core   │                  │  splitter-db     │            │
//! │  │  pure math, flow │                  │  snapshots,      │            │
//! │  │  reducer         │                  │  history         │            │
//! │  └──────────────────┘                  └──────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `SPLITTER_BIND_ADDR` - listen address
//! - `SPLITTER_DATABASE_PATH` - SQLite file
//! - `SPLITTER_JWT_SECRET` - session signing secret
//! - `RUST_LOG` - log filter

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use tracing_subscriber::EnvFilter;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=splitter=trace` - Show trace for the splitter crates only
/// - Default: `info,splitter=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,splitter=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
