//! # Split Allocation
//!
//! Turns a bill plus its split assignments into raw (unrounded) per-member
//! totals. Rounding happens later, in `reconcile`.
//!
//! ## Allocation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ItemSplit[] ──► split_amount(item.price) ──► item subtotal per member  │
//! │                                                       │                 │
//! │  tax split ────► split_amount(tax) ─────────┐         │                 │
//! │  other split ──► split_amount(other) ───────┤         ▼                 │
//! │                                             │   discount credited       │
//! │                                             │   ∝ item subtotal         │
//! │                                             ▼         │                 │
//! │                                    raw total = items + charges - credit │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                          ordered by the caller's member list            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Raw shares are fractional cents (`f64`). An equal split of $31.00 among
//! three members yields `1033.333…` each; the reconciler decides who gets
//! the odd cent.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Bill, ItemSplit, MemberId, SplitMode};

/// One member's unrounded total, in fractional cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShare {
    pub member_id: MemberId,
    pub cents: f64,
}

impl RawShare {
    pub fn new(member_id: impl Into<MemberId>, cents: f64) -> Self {
        RawShare {
            member_id: member_id.into(),
            cents,
        }
    }
}

/// Divides `amount` according to `mode`.
///
/// - `Equal`: every member gets `amount / n`
/// - `Custom`: the supplied amounts, unchanged
///
/// `target` names what is being split and only appears in errors.
///
/// ## Example
/// ```rust
/// use splitter_core::allocation::split_amount;
/// use splitter_core::money::Money;
/// use splitter_core::types::SplitMode;
///
/// let shares = split_amount(Money::from_cents(3000), &SplitMode::equal(["a", "b", "c"]), "Pizza").unwrap();
/// assert_eq!(shares.len(), 3);
/// assert!(shares.iter().all(|(_, cents)| *cents == 1000.0));
/// ```
pub fn split_amount(
    amount: Money,
    mode: &SplitMode,
    target: &str,
) -> CoreResult<Vec<(MemberId, f64)>> {
    match mode {
        SplitMode::Equal { members } => {
            if members.is_empty() {
                return Err(CoreError::NoMembers {
                    target: target.to_string(),
                });
            }
            let share = amount.as_cents_f64() / members.len() as f64;
            Ok(members.iter().map(|m| (m.clone(), share)).collect())
        }
        SplitMode::Custom { amounts } => {
            if amounts.is_empty() {
                return Err(CoreError::NoMembers {
                    target: target.to_string(),
                });
            }
            Ok(amounts
                .iter()
                .map(|(m, a)| (m.clone(), a.as_cents_f64()))
                .collect())
        }
    }
}

/// Running per-member totals, kept apart so the discount can be credited
/// against item subtotals only.
#[derive(Default)]
struct Ledger {
    items: HashMap<MemberId, f64>,
    charges: HashMap<MemberId, f64>,
    credits: HashMap<MemberId, f64>,
}

impl Ledger {
    fn contains(&self, id: &MemberId) -> bool {
        self.items.contains_key(id) || self.charges.contains_key(id)
    }

    fn total(&self, id: &MemberId) -> f64 {
        self.items.get(id).copied().unwrap_or(0.0) + self.charges.get(id).copied().unwrap_or(0.0)
            - self.credits.get(id).copied().unwrap_or(0.0)
    }
}

/// Aggregates item, tax and other-charge splits into raw per-member totals.
///
/// ## Arguments
/// * `member_order` - the group's members; fixes output order and membership
/// * `tax_split` / `other_charges_split` - required when the amount is > 0
///
/// ## Errors
/// - `ItemNotFound` for a split referencing an index not on the bill
/// - `NoMembers` for a split with nobody in it
/// - `UnknownMember` for a member outside `member_order`
/// - `UnassignedCharge` when tax or other charges are positive but unsplit
pub fn allocate(
    bill: &Bill,
    member_order: &[MemberId],
    item_splits: &[ItemSplit],
    tax_split: Option<&SplitMode>,
    other_charges_split: Option<&SplitMode>,
) -> CoreResult<Vec<RawShare>> {
    let known: HashSet<&MemberId> = member_order.iter().collect();
    let mut ledger = Ledger::default();

    for split in item_splits {
        let item = bill
            .item(split.item_index)
            .ok_or(CoreError::ItemNotFound {
                index: split.item_index,
            })?;
        let shares = split_amount(item.price, &split.mode, &item.name)?;
        credit(&mut ledger.items, shares, &known)?;
    }

    for (label, amount, split) in [
        ("Tax", bill.tax_amount(), tax_split),
        ("Other charges", bill.other_charges_amount(), other_charges_split),
    ] {
        if amount.is_zero() {
            continue;
        }
        if amount.is_negative() {
            return Err(CoreError::InvalidAmount {
                field: label.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        match split {
            Some(mode) if !mode.is_empty() => {
                let shares = split_amount(amount, mode, label)?;
                credit(&mut ledger.charges, shares, &known)?;
            }
            _ => {
                return Err(CoreError::UnassignedCharge {
                    charge: label.to_string(),
                    amount,
                });
            }
        }
    }

    let discount = bill.discount_amount();
    if !discount.is_zero() {
        ledger.credits = distribute_discount(discount, member_order, &ledger);
    }

    Ok(member_order
        .iter()
        .filter(|id| ledger.contains(id))
        .map(|id| RawShare {
            member_id: id.clone(),
            cents: ledger.total(id),
        })
        .collect())
}

/// Adds shares to a bucket, rejecting members outside the group.
fn credit(
    bucket: &mut HashMap<MemberId, f64>,
    shares: Vec<(MemberId, f64)>,
    known: &HashSet<&MemberId>,
) -> CoreResult<()> {
    for (member, cents) in shares {
        if !known.contains(&member) {
            return Err(CoreError::UnknownMember {
                member_id: member.to_string(),
            });
        }
        *bucket.entry(member).or_insert(0.0) += cents;
    }
    Ok(())
}

/// Credits the discount in proportion to each member's item subtotal.
///
/// With no item subtotal to weigh against (charges only), the discount is
/// spread equally across everyone who has a share.
fn distribute_discount(
    discount: Money,
    member_order: &[MemberId],
    ledger: &Ledger,
) -> HashMap<MemberId, f64> {
    let discount = discount.as_cents_f64();
    let subtotal: f64 = ledger.items.values().sum();

    if subtotal > 0.0 {
        return ledger
            .items
            .iter()
            .map(|(id, cents)| (id.clone(), discount * cents / subtotal))
            .collect();
    }

    let sharing: Vec<&MemberId> = member_order.iter().filter(|id| ledger.contains(id)).collect();
    if sharing.is_empty() {
        return HashMap::new();
    }
    let each = discount / sharing.len() as f64;
    sharing.into_iter().map(|id| (id.clone(), each)).collect()
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

    fn bill(prices: &[i64], tax: Option<i64>, discount: Option<i64>) -> Bill {
        let items: Vec<Item> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Item::new(i, format!("item {i}"), Money::from_cents(*p), 1))
            .collect();
        let total = prices.iter().sum::<i64>() + tax.unwrap_or(0) - discount.unwrap_or(0);
        Bill::new(
            "Test",
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            items,
            tax.map(Money::from_cents),
            None,
            discount.map(Money::from_cents),
            Money::from_cents(total),
            DISCREPANCY_TOLERANCE,
        )
    }

    #[test]
    fn test_equal_share_is_price_over_n() {
        let shares = split_amount(Money::from_cents(3100), &SplitMode::equal(["a", "b", "c"]), "x")
            .unwrap();
        for (_, cents) in shares {
            assert!((cents - 3100.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_equal_split_is_error() {
        let err = split_amount(Money::from_cents(100), &SplitMode::equal(Vec::<&str>::new()), "Fries")
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::NoMembers {
                target: "Fries".to_string()
            }
        );
    }

    #[test]
    fn test_custom_split_passes_amounts_through() {
        let mode = SplitMode::custom([("a", Money::from_cents(1500)), ("b", Money::from_cents(1499))]);
        let shares = split_amount(Money::from_cents(3000), &mode, "x").unwrap();
        assert_eq!(shares[0], (MemberId::new("a"), 1500.0));
        assert_eq!(shares[1], (MemberId::new("b"), 1499.0));
    }

    #[test]
    fn test_allocate_orders_by_member_list_and_skips_unassigned() {
        let bill = bill(&[1000, 2000], None, None);
        let order = ids(&["c", "b", "a"]);
        let splits = vec![
            ItemSplit { item_index: 0, mode: SplitMode::equal(["a"]) },
            ItemSplit { item_index: 1, mode: SplitMode::equal(["a", "c"]) },
        ];

        let raw = allocate(&bill, &order, &splits, None, None).unwrap();
        assert_eq!(raw, vec![RawShare::new("c", 1000.0), RawShare::new("a", 2000.0)]);
    }

    #[test]
    fn test_allocate_tax_and_proportional_discount() {
        // items 30.00 (a) + 10.00 (b), tax 4.00 equal, discount 8.00
        let bill = bill(&[3000, 1000], Some(400), Some(800));
        let order = ids(&["a", "b"]);
        let splits = vec![
            ItemSplit { item_index: 0, mode: SplitMode::equal(["a"]) },
            ItemSplit { item_index: 1, mode: SplitMode::equal(["b"]) },
        ];
        let tax = SplitMode::equal(["a", "b"]);

        let raw = allocate(&bill, &order, &splits, Some(&tax), None).unwrap();
        // a: 3000 + 200 - 600, b: 1000 + 200 - 200
        assert_eq!(raw, vec![RawShare::new("a", 2600.0), RawShare::new("b", 1000.0)]);
    }

    #[test]
    fn test_allocate_rejects_unassigned_tax() {
        let bill = bill(&[1000], Some(80), None);
        let splits = vec![ItemSplit { item_index: 0, mode: SplitMode::equal(["a"]) }];
        let err = allocate(&bill, &ids(&["a"]), &splits, None, None).unwrap_err();
        assert!(matches!(err, CoreError::UnassignedCharge { .. }));
    }

    #[test]
    fn test_allocate_rejects_negative_tax() {
        // A negative tax must not turn into a silent credit for the last member
        let bill = bill(&[1000], Some(-80), None);
        let splits = vec![ItemSplit { item_index: 0, mode: SplitMode::equal(["a"]) }];
        let err = allocate(&bill, &ids(&["a"]), &splits, None, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { ref field, .. } if field == "Tax"));
    }

    #[test]
    fn test_allocate_rejects_unknown_member_and_item() {
        let bill = bill(&[1000], None, None);
        let splits = vec![ItemSplit { item_index: 0, mode: SplitMode::equal(["zed"]) }];
        assert!(matches!(
            allocate(&bill, &ids(&["a"]), &splits, None, None),
            Err(CoreError::UnknownMember { .. })
        ));

        let splits = vec![ItemSplit { item_index: 7, mode: SplitMode::equal(["a"]) }];
        assert_eq!(
            allocate(&bill, &ids(&["a"]), &splits, None, None),
            Err(CoreError::ItemNotFound { index: 7 })
        );
    }
}
