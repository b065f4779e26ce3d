//! # Remainder Reconciliation
//!
//! Rounds raw shares to whole cents so that they add up to the bill total
//! exactly.
//!
//! ## Last Member Absorbs the Remainder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw shares (cents)      1033.33   1033.33   1033.33                    │
//! │                             │         │         │                       │
//! │  round all but last ──►   1033      1033        │                       │
//! │                                                 ▼                       │
//! │  last = total - Σ others            3100 - 2066 = 1034                  │
//! │                                                                         │
//! │  final                    $10.33    $10.33    $10.34   Σ = $31.00       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order is the caller's and is never reshuffled. The last member also
//! absorbs any within-tolerance gap between the summed components and the
//! stated total, since `total` is the receipt's own figure.

use crate::allocation::{allocate, split_amount, RawShare};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Bill, FinalSplit, ItemSplit, MemberId, SplitMode};

/// Rounds raw shares so the result sums to `total` exactly.
///
/// ## Errors
/// - `NoMembers` if `raw` is empty
/// - `InvalidAmount` if a raw share is NaN or infinite
///
/// ## Example
/// ```rust
/// use splitter_core::allocation::RawShare;
/// use splitter_core::money::Money;
/// use splitter_core::reconcile::reconcile;
///
/// let third = 3100.0 / 3.0;
/// let raw = vec![RawShare::new("a", third), RawShare::new("b", third), RawShare::new("c", third)];
///
/// let splits = reconcile(&raw, Money::from_cents(3100)).unwrap();
/// let owed: Vec<i64> = splits.iter().map(|s| s.amount_owed.cents()).collect();
/// assert_eq!(owed, vec![1033, 1033, 1034]);
/// ```
pub fn reconcile(raw: &[RawShare], total: Money) -> CoreResult<Vec<FinalSplit>> {
    let Some((last, others)) = raw.split_last() else {
        return Err(CoreError::NoMembers {
            target: "total".to_string(),
        });
    };

    let mut splits = Vec::with_capacity(raw.len());
    let mut assigned = Money::zero();

    for share in others {
        let amount = round_share(share)?;
        assigned += amount;
        splits.push(FinalSplit {
            member_id: share.member_id.clone(),
            amount_owed: amount,
        });
    }

    // Validate the last raw share even though its value is replaced.
    round_share(last)?;
    splits.push(FinalSplit {
        member_id: last.member_id.clone(),
        amount_owed: total - assigned,
    });

    Ok(splits)
}

fn round_share(share: &RawShare) -> CoreResult<Money> {
    if !share.cents.is_finite() {
        return Err(CoreError::InvalidAmount {
            field: share.member_id.to_string(),
            reason: "share is not a finite number".to_string(),
        });
    }
    Ok(Money::from_cents(share.cents.round() as i64))
}

/// Computes what each member owes for a scanned bill.
///
/// Allocation followed by reconciliation against `bill.total_cost`.
/// Guarantees `Σ amount_owed == bill.total_cost`.
pub fn calculate_final_splits(
    bill: &Bill,
    members: &[MemberId],
    item_splits: &[ItemSplit],
    tax_split: Option<&SplitMode>,
    other_charges_split: Option<&SplitMode>,
) -> CoreResult<Vec<FinalSplit>> {
    let raw = allocate(bill, members, item_splits, tax_split, other_charges_split)?;
    reconcile(&raw, bill.total_cost)
}

/// Computes what each member owes for a manually entered expense.
///
/// Output order follows `members`, restricted to those in `mode`.
pub fn calculate_manual_splits(
    amount: Money,
    members: &[MemberId],
    mode: &SplitMode,
) -> CoreResult<Vec<FinalSplit>> {
    let shares = split_amount(amount, mode, "Expense")?;

    for (id, _) in &shares {
        if !members.contains(id) {
            return Err(CoreError::UnknownMember {
                member_id: id.to_string(),
            });
        }
    }

    let raw: Vec<RawShare> = members
        .iter()
        .filter_map(|id| {
            let cents: f64 = shares
                .iter()
                .filter(|(m, _)| m == id)
                .map(|(_, c)| *c)
                .sum();
            shares.iter().any(|(m, _)| m == id).then(|| RawShare {
                member_id: id.clone(),
                cents,
            })
        })
        .collect();

    reconcile(&raw, amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::DISCREPANCY_TOLERANCE;
    use crate::types::Item;
    use chrono::NaiveDate;

    fn ids(names: &[&str]) -> Vec<MemberId> {
        names.iter().map(|n| MemberId::new(*n)).collect()
    }

    fn owed(splits: &[FinalSplit]) -> Vec<i64> {
        splits.iter().map(|s| s.amount_owed.cents()).collect()
    }

    #[test]
    fn test_three_way_split_last_absorbs_remainder() {
        let third = 3100.0 / 3.0;
        let raw = vec![
            RawShare::new("a", third),
            RawShare::new("b", third),
            RawShare::new("c", third),
        ];
        let splits = reconcile(&raw, Money::from_cents(3100)).unwrap();

        assert_eq!(owed(&splits), vec![1033, 1033, 1034]);
        assert_eq!(splits[2].member_id, MemberId::new("c"));
    }

    #[test]
    fn test_order_is_preserved() {
        let third = 3100.0 / 3.0;
        let raw = vec![
            RawShare::new("c", third),
            RawShare::new("a", third),
            RawShare::new("b", third),
        ];
        let splits = reconcile(&raw, Money::from_cents(3100)).unwrap();
        let order: Vec<&str> = splits.iter().map(|s| s.member_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(splits[2].amount_owed.cents(), 1034);
    }

    #[test]
    fn test_sum_always_equals_total() {
        for total in [1, 99, 100, 101, 3100, 9_999, 123_457] {
            for n in 1..=7 {
                let raw: Vec<RawShare> = (0..n)
                    .map(|i| RawShare::new(format!("m{i}").as_str(), total as f64 / n as f64))
                    .collect();
                let splits = reconcile(&raw, Money::from_cents(total)).unwrap();
                let sum: Money = splits.iter().map(|s| s.amount_owed).sum();
                assert_eq!(sum.cents(), total, "total {total} among {n}");
            }
        }
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(
            reconcile(&[], Money::from_cents(100)),
            Err(CoreError::NoMembers { .. })
        ));
    }

    #[test]
    fn test_non_finite_share_is_error() {
        let raw = vec![RawShare::new("a", f64::NAN), RawShare::new("b", 1.0)];
        assert!(matches!(
            reconcile(&raw, Money::from_cents(100)),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_calculate_final_splits_end_to_end() {
        // Pizza 30.00 three ways, soda 1.00 for b, tax 3.10 equal
        let bill = Bill::new(
            "Luigi's",
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            vec![
                Item::new(0, "Pizza", Money::from_cents(3000), 1),
                Item::new(1, "Soda", Money::from_cents(100), 1),
            ],
            Some(Money::from_cents(310)),
            None,
            None,
            Money::from_cents(3410),
            DISCREPANCY_TOLERANCE,
        );
        let members = ids(&["a", "b", "c"]);
        let splits = vec![
            ItemSplit {
                item_index: 0,
                mode: SplitMode::equal(["a", "b", "c"]),
            },
            ItemSplit {
                item_index: 1,
                mode: SplitMode::equal(["b"]),
            },
        ];
        let tax = SplitMode::equal(["a", "b", "c"]);

        let result = calculate_final_splits(&bill, &members, &splits, Some(&tax), None).unwrap();
        // a: 1000 + 103.33, b: 1100 + 103.33, c: remainder
        assert_eq!(owed(&result), vec![1103, 1203, 1104]);
        assert_eq!(result.iter().map(|s| s.amount_owed).sum::<Money>().cents(), 3410);
    }

    #[test]
    fn test_manual_splits() {
        let members = ids(&["a", "b", "c"]);
        let result = calculate_manual_splits(
            Money::from_cents(1000),
            &members,
            &SplitMode::equal(["c", "a", "b"]),
        )
        .unwrap();
        // Group order wins over the order in the split
        assert_eq!(owed(&result), vec![333, 333, 334]);
        assert_eq!(result[0].member_id, MemberId::new("a"));

        let err = calculate_manual_splits(
            Money::from_cents(1000),
            &members,
            &SplitMode::equal(["x"]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownMember { .. }));
    }
}
