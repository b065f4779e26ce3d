//! # splitter-db: Database Layer for Bill Splitter
//!
//! SQLite persistence for the two things that outlive a single request:
//! the per-user flow resume snapshot and the history of created expenses.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  split-api handler (POST /api/flow/actions, POST /api/expenses)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   splitter-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌─────────────┐ │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│ FlowSnapshotRepo   │  │ (embedded)  │ │   │
//! │  │   │  SqlitePool   │    │ ExpenseHistoryRepo │  │ 001_init    │ │   │
//! │  │   └───────────────┘    └────────────────────┘  └─────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (ApiConfig.database_path)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use splitter_db::{Database, DbConfig};
//!
//! # async fn run() -> Result<(), splitter_db::DbError> {
//! let db = Database::new(DbConfig::new("splitter.db")).await?;
//!
//! let history = db.history().list_for_user("12345", 20).await?;
//! println!("{} expenses", history.len());
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::flow_snapshot::FlowSnapshotRepository;
pub use repository::history::{ExpenseHistoryRepository, ExpenseRecord};
