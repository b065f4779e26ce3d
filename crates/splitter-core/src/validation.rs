//! # Validation Module
//!
//! Input validation for bills, split assignments and the manual expense form.
//!
//! ## Two Shapes of Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Field validators              validate_title, validate_expense_amount │
//! │  ├── One field, one rule set                                           │
//! │  └── Result<(), ValidationError>                                       │
//! │           │                                                             │
//! │           ▼ collected by                                                │
//! │  Report builders               validate_item_splits, validate_custom.. │
//! │  ├── Whole screen at once (every problem, not just the first)          │
//! │  └── ValidationReport { is_valid, errors }                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Finalize guard (flow.rs)                                              │
//! │  └── Any invalid report blocks submit                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Report builders never fail: bad user input is data, not an error.
//!
//! ## Usage
//! ```rust
//! use std::collections::BTreeMap;
//! use splitter_core::money::{Money, CUSTOM_SPLIT_TOLERANCE};
//! use splitter_core::types::MemberId;
//! use splitter_core::validation::validate_custom_amounts;
//!
//! let mut amounts = BTreeMap::new();
//! amounts.insert(MemberId::new("a"), Money::from_cents(1500));
//! amounts.insert(MemberId::new("b"), Money::from_cents(1499));
//!
//! let report = validate_custom_amounts(&amounts, Money::from_cents(3000), CUSTOM_SPLIT_TOLERANCE);
//! assert!(!report.is_valid());
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{Months, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Tolerance, CUSTOM_SPLIT_TOLERANCE, FORM_SPLIT_TOLERANCE};
use crate::types::{Bill, ItemSplit, ManualExpense, MemberId, SplitMode};
use crate::{MAX_EXPENSE_AMOUNT, MAX_ITEM_QUANTITY, MAX_TITLE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Validation Report
// =============================================================================

/// Every problem found on one screen.
///
/// Serializes as `{ "isValid": bool, "errors": [message, ...] }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport::default()
    }

    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        ValidationReport { errors }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Human-readable messages, in the order they were found.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records the error of a field validator, if any.
    pub fn check(&mut self, result: ValidationResult<()>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 2)?;
        state.serialize_field("isValid", &self.is_valid())?;
        state.serialize_field("errors", &self.messages())?;
        state.end()
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an expense title.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most `MAX_TITLE_LENGTH` characters
///
/// ## Example
/// ```rust
/// use splitter_core::validation::validate_title;
///
/// assert!(validate_title("Dinner at Luigi's").is_ok());
/// assert!(validate_title("   ").is_err());
/// ```
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

/// Validates the amount of a manually entered expense.
///
/// ## Rules
/// - Greater than zero
/// - At most `MAX_EXPENSE_AMOUNT` ($999,999.99)
pub fn validate_expense_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if amount > MAX_EXPENSE_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field: "amount".to_string(),
            max: MAX_EXPENSE_AMOUNT,
        });
    }

    Ok(())
}

/// Validates an expense date against an injected `today`.
///
/// ## Rules
/// - Not after `today`
/// - Not more than one year before `today`
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use splitter_core::validation::validate_expense_date;
///
/// let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
/// assert!(validate_expense_date(today, today).is_ok());
/// assert!(validate_expense_date(NaiveDate::from_ymd_opt(2026, 6, 16).unwrap(), today).is_err());
/// assert!(validate_expense_date(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(), today).is_err());
/// ```
pub fn validate_expense_date(date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if date > today {
        return Err(ValidationError::DateInFuture {
            field: "date".to_string(),
        });
    }

    if let Some(earliest) = today.checked_sub_months(Months::new(12)) {
        if date < earliest {
            return Err(ValidationError::DateTooOld {
                field: "date".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates any amount printed on a bill: a unit price, line total, charge,
/// discount or the receipt total.
///
/// ## Rules
/// - Not negative (zero is fine: free items, no tax)
/// - At most `MAX_EXPENSE_AMOUNT`
///
/// ## Example
/// ```rust
/// use splitter_core::money::Money;
/// use splitter_core::validation::validate_bill_amount;
///
/// assert!(validate_bill_amount("taxes", Money::from_cents(0)).is_ok());
/// assert!(validate_bill_amount("taxes", Money::from_cents(-5)).is_err());
/// assert!(validate_bill_amount("price", Money::from_cents(100_000_000)).is_err());
/// ```
pub fn validate_bill_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    if amount > MAX_EXPENSE_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field: field.to_string(),
            max: MAX_EXPENSE_AMOUNT,
        });
    }

    Ok(())
}

/// Validates a line-item quantity (1 to `MAX_ITEM_QUANTITY`).
pub fn validate_item_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: format!("must be at most {MAX_ITEM_QUANTITY}"),
        });
    }

    Ok(())
}

// =============================================================================
// Split Validators
// =============================================================================

fn check_custom_amounts(
    target: &str,
    amounts: &BTreeMap<MemberId, Money>,
    expected: Money,
    tolerance: Tolerance,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if amounts.is_empty() {
        errors.push(ValidationError::NoMembersAssigned {
            target: target.to_string(),
        });
        return errors;
    }

    for (member, amount) in amounts {
        if !amount.is_positive() {
            errors.push(ValidationError::NonPositiveShare {
                target: target.to_string(),
                member_id: member.to_string(),
            });
        }
    }

    let actual: Money = amounts.values().sum();
    if tolerance.is_reached_by(actual - expected) {
        errors.push(ValidationError::SumMismatch {
            target: target.to_string(),
            expected,
            actual,
        });
    }

    errors
}

fn check_split(
    target: &str,
    mode: &SplitMode,
    expected: Money,
    tolerance: Tolerance,
) -> Vec<ValidationError> {
    match mode {
        SplitMode::Equal { members } if members.is_empty() => {
            vec![ValidationError::NoMembersAssigned {
                target: target.to_string(),
            }]
        }
        SplitMode::Equal { .. } => Vec::new(),
        SplitMode::Custom { amounts } => check_custom_amounts(target, amounts, expected, tolerance),
    }
}

/// Checks a set of custom amounts against the amount they should cover.
///
/// Invalid when any amount is zero or negative, or when the sum is off by
/// `tolerance` or more. The boundary itself counts as a mismatch.
pub fn validate_custom_amounts(
    amounts: &BTreeMap<MemberId, Money>,
    expected_total: Money,
    tolerance: Tolerance,
) -> ValidationReport {
    ValidationReport::from_errors(check_custom_amounts(
        "Split",
        amounts,
        expected_total,
        tolerance,
    ))
}

/// Checks that every bill item is assigned exactly once, to at least one
/// member, with custom amounts adding up to the item price.
pub fn validate_item_splits(bill: &Bill, splits: &[ItemSplit]) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut seen = HashSet::new();

    for split in splits {
        let Some(item) = bill.item(split.item_index) else {
            report.push(ValidationError::UnknownItem {
                index: split.item_index,
            });
            continue;
        };

        if !seen.insert(split.item_index) {
            report.push(ValidationError::DuplicateItem {
                index: split.item_index,
            });
            continue;
        }

        if split.mode.is_empty() {
            report.push(ValidationError::ItemUnassigned {
                index: item.index,
                name: item.name.clone(),
            });
            continue;
        }

        for e in check_split(&item.name, &split.mode, item.price, CUSTOM_SPLIT_TOLERANCE) {
            report.push(e);
        }
    }

    for item in &bill.items {
        if !seen.contains(&item.index) {
            report.push(ValidationError::ItemUnassigned {
                index: item.index,
                name: item.name.clone(),
            });
        }
    }

    report
}

/// Checks the tax and other-charges splits.
///
/// A split is required only when its amount is greater than zero.
pub fn validate_charge_splits(
    bill: &Bill,
    tax_split: Option<&SplitMode>,
    other_charges_split: Option<&SplitMode>,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (label, amount, split) in [
        ("Tax", bill.tax_amount(), tax_split),
        ("Other charges", bill.other_charges_amount(), other_charges_split),
    ] {
        if amount.is_negative() {
            report.push(ValidationError::InvalidFormat {
                field: label.to_string(),
                reason: "must not be negative".to_string(),
            });
            continue;
        }
        if amount.is_zero() {
            continue;
        }
        match split {
            Some(mode) => {
                for e in check_split(label, mode, amount, CUSTOM_SPLIT_TOLERANCE) {
                    report.push(e);
                }
            }
            None => report.push(ValidationError::NoMembersAssigned {
                target: label.to_string(),
            }),
        }
    }

    report
}

/// Checks the split of a manually entered expense.
pub fn validate_manual_split(amount: Money, mode: &SplitMode) -> ValidationReport {
    ValidationReport::from_errors(check_split("Expense", mode, amount, FORM_SPLIT_TOLERANCE))
}

// =============================================================================
// Expense Form
// =============================================================================

/// The manual expense form as typed in: decimal amount, ISO date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseForm {
    pub title: String,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validates and converts the expense form.
///
/// Returns every problem at once when the form is invalid.
pub fn parse_expense_form(
    form: &ExpenseForm,
    today: NaiveDate,
) -> Result<ManualExpense, ValidationReport> {
    let mut report = ValidationReport::new();

    report.check(validate_title(&form.title));

    let amount = match Money::from_decimal(form.amount) {
        Some(amount) => {
            report.check(validate_expense_amount(amount));
            Some(amount)
        }
        None => {
            report.push(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "not a number".to_string(),
            });
            None
        }
    };

    let date = match NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d") {
        Ok(date) => {
            report.check(validate_expense_date(date, today));
            Some(date)
        }
        Err(_) => {
            report.push(ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            });
            None
        }
    };

    match (amount, date) {
        (Some(amount), Some(date)) if report.is_valid() => Ok(ManualExpense {
            title: form.title.trim().to_string(),
            amount,
            date,
            notes: form.notes.clone(),
        }),
        _ => Err(report),
    }
}

/// Validates the expense form without converting it.
pub fn validate_expense_form(form: &ExpenseForm, today: NaiveDate) -> ValidationReport {
    match parse_expense_form(form, today) {
        Ok(_) => ValidationReport::new(),
        Err(report) => report,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
