//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  split-api handler                                                     │
//! │       │                                                                 │
//! │       │  db.snapshots().upsert(user_id, &snapshot)                     │
//! │       │  db.history().list_for_user(user_id, 20)                       │
//! │       ▼                                                                 │
//! │  FlowSnapshotRepository        ExpenseHistoryRepository                │
//! │  ├── upsert(user_id, snap)     ├── record(entry)                       │
//! │  ├── get(user_id)              ├── list_for_user(user_id, limit)       │
//! │  └── delete(user_id)           └── get(id)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (JSON columns for Bill / FinalSplit, INTEGER cents)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod flow_snapshot;
pub mod history;
