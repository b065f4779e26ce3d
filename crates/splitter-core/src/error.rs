//! # Error Types
//!
//! Domain-specific error types for splitter-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  splitter-core errors (this file)                                      │
//! │  ├── CoreError        - Programmer errors and finalization blockers    │
//! │  ├── ValidationError  - One user-correctable problem                   │
//! │  └── FlowError        - Illegal flow transition (flow.rs)              │
//! │                                                                         │
//! │  splitter-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  split-api errors (in app)                                             │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Client                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reporting vs Failing
//! Validators never return `Err` for bad user input. They collect
//! `ValidationError`s into a `ValidationReport` (see `validation.rs`).
//! `CoreError` is reserved for inputs the caller should never produce
//! (no members, unknown item index) and for the submit-blocking checks.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// An item index does not exist on the bill.
    #[error("Item {index} not found on bill")]
    ItemNotFound { index: usize },

    /// A split computation was given an empty member list.
    ///
    /// ## When This Occurs
    /// - Equal split with no members selected
    /// - Reconciling an empty set of raw totals
    ///
    /// The validators catch both cases first; reaching this is a caller bug.
    #[error("Cannot split {target} among zero members")]
    NoMembers { target: String },

    /// A split references a member that is not part of the group.
    #[error("Member {member_id} is not part of the group")]
    UnknownMember { member_id: String },

    /// Tax or other charges are non-zero but nobody was assigned to them.
    #[error("{charge} of {amount} has no members assigned")]
    UnassignedCharge { charge: String, amount: Money },

    /// An amount could not be represented (NaN, infinite, overflow).
    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// The expense cannot be submitted yet.
    ///
    /// ## User Workflow
    /// ```text
    /// Review screen ──► "Create expense"
    ///      │
    ///      ▼
    /// Discrepancy unresolved? ──► FinalizationBlocked (edit prices first)
    ///      │
    ///      ▼
    /// Split sums off? ──────────► FinalizationBlocked (fix assignments)
    /// ```
    #[error("Expense cannot be finalized: {}", .reasons.join("; "))]
    FinalizationBlocked { reasons: Vec<String> },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Each variant is one field-level, user-correctable message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Amount above the allowed maximum.
    #[error("{field} must not exceed {max}")]
    AmountTooLarge { field: String, max: Money },

    /// Invalid format (e.g., unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date lies after today.
    #[error("{field} cannot be in the future")]
    DateInFuture { field: String },

    /// Date lies more than one year before today.
    #[error("{field} cannot be more than one year in the past")]
    DateTooOld { field: String },

    /// An item has no split assigned, or its split has no members.
    #[error("Item \"{name}\" has no members assigned")]
    ItemUnassigned { index: usize, name: String },

    /// Tax / other charges / the manual expense has no members assigned.
    #[error("{target} has no members assigned")]
    NoMembersAssigned { target: String },

    /// Custom amounts do not add up to the amount being split.
    #[error("{target} custom amounts total {actual}, expected {expected}")]
    SumMismatch {
        target: String,
        expected: Money,
        actual: Money,
    },

    /// A custom amount is zero or negative.
    #[error("{target} amount for {member_id} must be greater than zero")]
    NonPositiveShare { target: String, member_id: String },

    /// A split references an item index the bill does not have.
    #[error("Split references unknown item {index}")]
    UnknownItem { index: usize },

    /// The same item was assigned twice.
    #[error("Item {index} is assigned more than once")]
    DuplicateItem { index: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
