//! # State Module
//!
//! Shared state handed to every axum handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(AppState)                                          │
//! │          │                                                              │
//! │          ├──────────────────┬──────────────────┬──────────────────┐    │
//! │          ▼                  ▼                  ▼                  ▼    │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐ │
//! │  │   Database   │  │ FlowSessions │  │  ApiConfig   │  │ Session    │ │
//! │  │              │  │              │  │              │  │ Issuer     │ │
//! │  │  SQLite pool │  │  Arc<Mutex<  │  │  Arc, read   │  │ JWT keys   │ │
//! │  │              │  │   HashMap>>  │  │  only        │  │            │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘ │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • FlowSessions: Arc<Mutex<T>> for exclusive access                    │
//! │  • ApiConfig / SessionIssuer: read-only after startup                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cloning `AppState` is cheap; axum clones it per request.

mod flow;

use std::sync::Arc;

use chrono::Utc;
use splitter_core::{FlowContext, Tolerance};
use splitter_db::Database;

use crate::auth::SessionIssuer;
use crate::config::ApiConfig;

pub use flow::FlowSessions;

/// Handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub sessions: FlowSessions,
    pub issuer: SessionIssuer,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let issuer = SessionIssuer::new(&config.jwt_secret, config.session_lifetime_secs);
        AppState {
            db,
            config: Arc::new(config),
            sessions: FlowSessions::new(),
            issuer,
        }
    }

    /// The configured discrepancy tolerance.
    pub fn tolerance(&self) -> Tolerance {
        self.config.tolerance().unwrap_or_default()
    }

    /// Reducer context for a request handled now.
    pub fn flow_context(&self) -> FlowContext {
        FlowContext::new(Utc::now().date_naive()).with_tolerance(self.tolerance())
    }
}
