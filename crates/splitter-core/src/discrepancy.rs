//! # Discrepancy Detection
//!
//! Compares a receipt's stated total against the sum of its components.
//!
//! ```text
//! expected   = Σ item.price + tax + other_charges - discount
//! difference = total_cost - expected
//! flag       = |difference| > tolerance
//! ```
//!
//! A discrepancy never blocks editing. It is attached to the `Bill` as a
//! warning and only blocks the final submit while it is unresolved.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Tolerance};

/// Result of comparing a receipt's stated total with its components.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discrepancy {
    pub flag: bool,
    pub message: Option<String>,
}

impl Discrepancy {
    /// No discrepancy.
    pub fn none() -> Self {
        Discrepancy::default()
    }
}

/// Detects a mismatch between the stated total and the summed components.
///
/// Missing tax, other charges or discount count as zero. A difference exactly
/// equal to `tolerance` is not flagged.
///
/// ## Example
/// ```rust
/// use splitter_core::discrepancy::detect_discrepancy;
/// use splitter_core::money::{Money, DISCREPANCY_TOLERANCE};
///
/// let prices = [Money::from_cents(1000), Money::from_cents(2000)];
///
/// let ok = detect_discrepancy(prices, Money::from_cents(3000), None, None, None, DISCREPANCY_TOLERANCE);
/// assert!(!ok.flag);
///
/// let off = detect_discrepancy(prices, Money::from_cents(3300), None, None, None, DISCREPANCY_TOLERANCE);
/// assert!(off.flag);
/// assert!(off.message.unwrap().contains("$3.00"));
/// ```
pub fn detect_discrepancy<I>(
    item_prices: I,
    total_cost: Money,
    tax: Option<Money>,
    other_charges: Option<Money>,
    discount: Option<Money>,
    tolerance: Tolerance,
) -> Discrepancy
where
    I: IntoIterator<Item = Money>,
{
    let items: Money = item_prices.into_iter().sum();
    let expected = items + tax.unwrap_or_default() + other_charges.unwrap_or_default()
        - discount.unwrap_or_default();
    let difference = total_cost - expected;

    if !tolerance.is_exceeded_by(difference) {
        return Discrepancy::none();
    }

    Discrepancy {
        flag: true,
        message: Some(format!(
            "Receipt total {} does not match the sum of items, tax and charges {} (difference {})",
            total_cost,
            expected,
            difference.abs()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::DISCREPANCY_TOLERANCE;

    fn cents(values: &[i64]) -> Vec<Money> {
        values.iter().copied().map(Money::from_cents).collect()
    }

    #[test]
    fn test_matching_total_not_flagged() {
        let d = detect_discrepancy(
            cents(&[1000, 2000]),
            Money::from_cents(3000),
            None,
            None,
            None,
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(d, Discrepancy::none());
    }

    #[test]
    fn test_mismatch_flagged_with_difference() {
        let d = detect_discrepancy(
            cents(&[1000, 2000]),
            Money::from_cents(3300),
            None,
            None,
            None,
            DISCREPANCY_TOLERANCE,
        );
        assert!(d.flag);
        assert!(d.message.unwrap().contains("$3.00"));
    }

    #[test]
    fn test_exactly_at_tolerance_not_flagged() {
        let at = detect_discrepancy(
            cents(&[1000]),
            Money::from_cents(1002),
            None,
            None,
            None,
            DISCREPANCY_TOLERANCE,
        );
        assert!(!at.flag);

        let over = detect_discrepancy(
            cents(&[1000]),
            Money::from_cents(997),
            None,
            None,
            None,
            DISCREPANCY_TOLERANCE,
        );
        assert!(over.flag);
    }

    #[test]
    fn test_charges_and_discount_included() {
        // 20.00 + 1.60 tax + 2.00 tip - 3.00 coupon = 20.60
        let d = detect_discrepancy(
            cents(&[2000]),
            Money::from_cents(2060),
            Some(Money::from_cents(160)),
            Some(Money::from_cents(200)),
            Some(Money::from_cents(300)),
            DISCREPANCY_TOLERANCE,
        );
        assert!(!d.flag);
    }

    #[test]
    fn test_empty_bill() {
        let d = detect_discrepancy(
            Vec::new(),
            Money::zero(),
            None,
            None,
            None,
            DISCREPANCY_TOLERANCE,
        );
        assert!(!d.flag);
    }
}
