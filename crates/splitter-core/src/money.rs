//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `Tolerance` type used when comparing two amounts that are allowed to drift.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Receipt amounts arrive as decimals from the extraction model:          │
//! │    10.10 + 20.20 = 30.299999999999997                                   │
//! │                                                                         │
//! │  Splitting three ways:                                                  │
//! │    $31.00 / 3 = $10.333... (rounded ×3 = $30.99)  → Lost $0.01!        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Decimals are converted ONCE at the boundary (from_decimal)           │
//! │    Every sum, difference and comparison after that is exact            │
//! │    The reconciler handles the split remainder explicitly                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use splitter_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                     // $21.98
//! let total = price + Money::from_cents(500);  // $15.99
//!
//! // Boundary conversion for extracted/typed-in decimals
//! let scanned = Money::from_decimal(14.99).unwrap();
//! assert_eq!(scanned.cents(), 1499);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts and differences
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: The API and database both speak cents
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  ExtractedReceipt (f64) ──► from_decimal ──► Item.price ──► Bill        │
/// │                                                                         │
/// │  Bill.total_cost ──► Allocation ──► Reconciliation ──► FinalSplit       │
/// │                                                                         │
/// │  FinalSplit.amount_owed ──► decimal_string() ──► expense payload        │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -$5.50
    /// assert_eq!(negative.cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal currency amount into cents, rounding to the
    /// nearest cent (half away from zero).
    ///
    /// This is the only place a float enters the money domain. Extraction
    /// output and typed-in form values go through here exactly once.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 cent range.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(10.336).unwrap().cents(), 1034);
    /// assert_eq!(Money::from_decimal(-3.0).unwrap().cents(), -300);
    /// assert!(Money::from_decimal(f64::NAN).is_none());
    /// ```
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        let cents = (value * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }

        Some(Money(cents as i64))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as fractional cents, used as the input of share
    /// arithmetic where an amount is divided among members.
    #[inline]
    pub fn as_cents_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Returns the value as a decimal currency amount (for display/export only).
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit (dollars) portion.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).dollars(), 10);
    /// assert_eq!(Money::from_cents(-550).dollars(), -5);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // $8.97
    /// ```
    ///
    /// Saturates at the `i64` bounds; use [`Money::checked_multiply_quantity`]
    /// where an out-of-range result must be reported.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_cents(1000)));
    /// assert!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3).is_none());
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Formats the amount as a plain decimal string without a currency
    /// symbol, as expected by the expense-sharing service ("10.33", "-0.50").
    pub fn decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

    /// Formats the amount with an arbitrary currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-1234).format_with("€"), "-€12.34");
    /// ```
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            symbol,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as "$10.99". Used in user-facing messages
/// (discrepancy warnings, validation errors).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tolerance
// =============================================================================

/// An allowed absolute drift between two amounts, in thousandths of a
/// currency unit ("mills").
///
/// ## Why Mills?
/// The product uses three different tolerances for "these two amounts match":
/// 0.01, 0.015 and 0.02. The middle one is not a whole number of cents, so
/// tolerances are one decimal place finer than `Money` and compared exactly.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Constant                  Mills   Used by                              │
/// │  ───────────────────────   ─────   ──────────────────────────────────   │
/// │  CUSTOM_SPLIT_TOLERANCE     10     per-item custom amounts              │
/// │  FORM_SPLIT_TOLERANCE       15     manual expense custom amounts        │
/// │  DISCREPANCY_TOLERANCE      20     receipt total vs components          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tolerance(i64);

/// Tolerance for per-item custom split amounts (0.01).
pub const CUSTOM_SPLIT_TOLERANCE: Tolerance = Tolerance::from_mills(10);

/// Tolerance for custom split amounts on a manually entered expense (0.015).
pub const FORM_SPLIT_TOLERANCE: Tolerance = Tolerance::from_mills(15);

/// Tolerance between a receipt's stated total and its summed components (0.02).
pub const DISCREPANCY_TOLERANCE: Tolerance = Tolerance::from_mills(20);

impl Tolerance {
    /// Creates a tolerance from thousandths of a currency unit.
    #[inline]
    pub const fn from_mills(mills: i64) -> Self {
        Tolerance(mills)
    }

    /// Creates a tolerance from a decimal currency amount (e.g. `0.02`).
    ///
    /// Returns `None` for negative or non-finite values.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::Tolerance;
    ///
    /// assert_eq!(Tolerance::from_decimal(0.015).unwrap().mills(), 15);
    /// assert!(Tolerance::from_decimal(-0.01).is_none());
    /// ```
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Tolerance((value * 1000.0).round() as i64))
    }

    /// Returns the tolerance in mills.
    #[inline]
    pub const fn mills(&self) -> i64 {
        self.0
    }

    /// True when `difference` is strictly larger than the tolerance.
    ///
    /// A difference exactly equal to the tolerance is NOT exceeded.
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::{Money, DISCREPANCY_TOLERANCE};
    ///
    /// assert!(!DISCREPANCY_TOLERANCE.is_exceeded_by(Money::from_cents(2)));
    /// assert!(DISCREPANCY_TOLERANCE.is_exceeded_by(Money::from_cents(-3)));
    /// ```
    #[inline]
    pub const fn is_exceeded_by(&self, difference: Money) -> bool {
        difference.cents().abs() * 10 > self.0
    }

    /// True when `difference` is at least as large as the tolerance.
    ///
    /// Used where the boundary itself counts as a mismatch.
    #[inline]
    pub const fn is_reached_by(&self, difference: Money) -> bool {
        difference.cents().abs() * 10 >= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        DISCREPANCY_TOLERANCE
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, (self.0 % 1000).abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
