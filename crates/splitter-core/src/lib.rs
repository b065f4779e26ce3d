//! # splitter-core: Pure Reconciliation Logic for Bill Splitter
//!
//! This crate is the **heart** of Bill Splitter. It turns a receipt and a
//! set of "who had what" assignments into amounts owed that add up to the
//! receipt total to the cent. Everything here is a pure function.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bill Splitter Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (out of tree)                       │   │
//! │  │   Type ──► Upload/Details ──► Group ──► Split ──► Review       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    split-api (axum)                             │   │
//! │  │    /api/bills, /api/splits, /api/flow, /api/expenses           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ splitter-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐  │   │
//! │  │   │discrepancy │ │ allocation │ │ reconcile  │ │ validation │  │   │
//! │  │   │ total vs Σ │ │ raw shares │ │ remainder  │ │  reports   │  │   │
//! │  │   └────────────┘ └────────────┘ └────────────┘ └────────────┘  │   │
//! │  │   ┌────────────┐ ┌────────────┐ ┌────────────┐                 │   │
//! │  │   │    flow    │ │  expense   │ │  receipt   │                 │   │
//! │  │   │  reducer   │ │  payload   │ │ extraction │                 │   │
//! │  │   └────────────┘ └────────────┘ └────────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 splitter-db (Database Layer)                    │   │
//! │  │           Resume snapshots, expense history (SQLite)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent `Money` and mill-precision `Tolerance`
//! - [`types`] - Bill, Item, Group, Member, splits
//! - [`discrepancy`] - Receipt total vs summed components
//! - [`allocation`] - Raw per-member shares
//! - [`reconcile`] - Remainder correction, final splits
//! - [`validation`] - Field validators and validation reports
//! - [`flow`] - Expense wizard state machine
//! - [`expense`] - Payload for the expense-sharing service
//! - [`receipt`] - Extraction schema and `Bill::from_extraction`
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use splitter_core::money::{Money, DISCREPANCY_TOLERANCE};
//! use splitter_core::reconcile::calculate_final_splits;
//! use splitter_core::types::{Bill, Item, ItemSplit, MemberId, SplitMode};
//!
//! let bill = Bill::new(
//!     "Luigi's",
//!     NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
//!     vec![Item::new(0, "Pizza", Money::from_cents(3100), 1)],
//!     None,
//!     None,
//!     None,
//!     Money::from_cents(3100),
//!     DISCREPANCY_TOLERANCE,
//! );
//! let members: Vec<MemberId> = ["a", "b", "c"].into_iter().map(MemberId::from).collect();
//! let splits = vec![ItemSplit { item_index: 0, mode: SplitMode::equal(["a", "b", "c"]) }];
//!
//! let result = calculate_final_splits(&bill, &members, &splits, None, None).unwrap();
//!
//! // $31.00 three ways: the last member absorbs the odd cent
//! let owed: Vec<i64> = result.iter().map(|s| s.amount_owed.cents()).collect();
//! assert_eq!(owed, vec![1033, 1033, 1034]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod discrepancy;
pub mod error;
pub mod expense;
pub mod flow;
pub mod money;
pub mod receipt;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discrepancy::{detect_discrepancy, Discrepancy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use flow::{reduce, FlowAction, FlowContext, FlowError, FlowSnapshot, FlowState, FlowStep, FlowType};
pub use money::{Money, Tolerance};
pub use reconcile::{calculate_final_splits, calculate_manual_splits, reconcile};
pub use types::*;
pub use validation::{validate_custom_amounts, ValidationReport};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest amount accepted for a manually entered expense ($999,999.99).
///
/// Also caps every amount on a bill (unit price, line total, charges,
/// discount, total), which keeps all bill arithmetic far from `i64` overflow.
pub const MAX_EXPENSE_AMOUNT: Money = Money::from_cents(99_999_999);

/// Longest accepted expense title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Largest quantity accepted on one extracted line item.
///
/// ## Business Reason
/// Catches extraction misreads (a price read into the quantity column).
pub const MAX_ITEM_QUANTITY: u32 = 999;
