//! # split-api binary
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Startup Sequence                                 │
//! │                                                                         │
//! │  init_tracing ──► ApiConfig::load ──► Database::new (migrations)       │
//! │                                              │                          │
//! │                                              ▼                          │
//! │  Ctrl+C / SIGTERM ◄── axum::serve ◄── build_router(AppState)           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  graceful shutdown ──► db.close()                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use splitter_api::{build_router, init_tracing, ApiConfig, AppState};
use splitter_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Bill Splitter API...");

    let config = ApiConfig::load(None)?;
    let addr: SocketAddr = config.bind_addr.parse()?;
    info!(
        addr = %addr,
        db_path = %config.database_path.display(),
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
    let state = AppState::new(db.clone(), config);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    if let Err(e) = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
    }

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed, that signal source is ignored and the
/// other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
