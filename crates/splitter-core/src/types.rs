//! # Domain Types
//!
//! Core domain types used throughout the bill splitter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Bill       │   │      Item       │   │     Group       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  store_name     │   │  index (id)     │   │  id (external)  │       │
//! │  │  date           │◄──│  name           │   │  name           │       │
//! │  │  items          │   │  unit_price     │   │  members ───────┼──┐    │
//! │  │  tax / other    │   │  quantity       │   └─────────────────┘  │    │
//! │  │  discount       │   │  price (line)   │                        ▼    │
//! │  │  total_cost     │   └─────────────────┘   ┌─────────────────┐       │
//! │  │  discrepancy    │                         │     Member      │       │
//! │  └─────────────────┘                         │  id (MemberId)  │       │
//! │                                              │  name           │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   └─────────────────┘       │
//! │  │   ItemSplit     │   │   FinalSplit    │                             │
//! │  │  item_index     │   │  member_id      │                             │
//! │  │  mode ──► Equal │   │  amount_owed    │                             │
//! │  │       └─► Custom│   └─────────────────┘                             │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Members are identified by the expense-sharing service's user id.
//! - Items are identified by their position on the bill. Positions never
//!   change after extraction; price corrections edit in place.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discrepancy::{detect_discrepancy, Discrepancy};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Tolerance};
use crate::validation::{validate_bill_amount, validate_item_quantity};

// =============================================================================
// Members & Groups
// =============================================================================

/// Opaque member identifier issued by the expense-sharing service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        MemberId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        MemberId::new(id)
    }
}

/// A participant in an expense-sharing group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// An expense-sharing group.
///
/// `members` order is significant: it is the ordering handed to the
/// reconciler, so the LAST member absorbs any rounding remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Group {
    /// External group id.
    pub id: String,
    pub name: String,
    pub members: Vec<Member>,
}

impl Group {
    /// Member ids in group order.
    pub fn member_order(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    /// Checks whether a member belongs to this group.
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

// =============================================================================
// Item
// =============================================================================

/// A line item on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    /// Position on the bill, used as the item's identifier.
    pub index: usize,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// Line total (unit_price × quantity).
    pub price: Money,
}

impl Item {
    /// Creates an item, collapsing unit price × quantity into the line total.
    pub fn new(index: usize, name: impl Into<String>, unit_price: Money, quantity: u32) -> Self {
        Item {
            index,
            name: name.into(),
            unit_price,
            quantity,
            price: unit_price.multiply_quantity(i64::from(quantity)),
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// The receipt (or manually entered expense) being split.
///
/// ## Lifecycle
/// ```text
/// ExtractedReceipt ──► Bill::from_extraction ──► (price corrections) ──► submit
///                           │                          │
///                           ▼                          ▼
///                     discrepancy computed     discrepancy recomputed
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bill {
    pub store_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub items: Vec<Item>,
    pub tax: Option<Money>,
    pub other_charges: Option<Money>,
    pub discount: Option<Money>,
    pub total_cost: Money,
    pub discrepancy: Discrepancy,
}

impl Bill {
    /// Creates a bill and computes its discrepancy.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store_name: impl Into<String>,
        date: NaiveDate,
        items: Vec<Item>,
        tax: Option<Money>,
        other_charges: Option<Money>,
        discount: Option<Money>,
        total_cost: Money,
        tolerance: Tolerance,
    ) -> Self {
        let mut bill = Bill {
            store_name: store_name.into(),
            date,
            items,
            tax,
            other_charges,
            discount,
            total_cost,
            discrepancy: Discrepancy::none(),
        };
        bill.refresh_discrepancy(tolerance);
        bill
    }

    /// Looks up an item by index.
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.iter().find(|i| i.index == index)
    }

    /// Sum of all line totals.
    pub fn items_subtotal(&self) -> Money {
        self.items.iter().map(|i| i.price).sum()
    }

    #[inline]
    pub fn tax_amount(&self) -> Money {
        self.tax.unwrap_or_default()
    }

    #[inline]
    pub fn other_charges_amount(&self) -> Money {
        self.other_charges.unwrap_or_default()
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        self.discount.unwrap_or_default()
    }

    /// Checks that every amount on a bill received from a client is in range
    /// and that each line total is its unit price times its quantity.
    ///
    /// Bills built by `from_extraction` already satisfy this; a bill that
    /// arrives as a request body must pass it before any arithmetic runs.
    ///
    /// ## Errors
    /// - `Validation` for a negative or too large amount, or a bad quantity
    /// - `InvalidAmount` for a line total that does not match
    pub fn validate_amounts(&self) -> CoreResult<()> {
        for item in &self.items {
            validate_item_quantity(item.quantity)?;
            validate_bill_amount("price", item.unit_price)?;
            validate_bill_amount("price", item.price)?;

            if item.unit_price.checked_multiply_quantity(i64::from(item.quantity)) != Some(item.price) {
                return Err(CoreError::InvalidAmount {
                    field: "price".to_string(),
                    reason: format!(
                        "line total of item {} is not unit price × quantity",
                        item.index
                    ),
                });
            }
        }

        for (field, amount) in [
            ("taxes", self.tax),
            ("otherCharges", self.other_charges),
            ("discount", self.discount),
        ] {
            if let Some(amount) = amount {
                validate_bill_amount(field, amount)?;
            }
        }

        validate_bill_amount("totalCost", self.total_cost)?;
        Ok(())
    }

    /// Recomputes the discrepancy after any edit.
    pub fn refresh_discrepancy(&mut self, tolerance: Tolerance) {
        self.discrepancy = detect_discrepancy(
            self.items.iter().map(|i| i.price),
            self.total_cost,
            self.tax,
            self.other_charges,
            self.discount,
            tolerance,
        );
    }

    /// Corrects the unit price of an item (e.g. the scan misread "8.99" as
    /// "6.99") and recomputes the discrepancy.
    ///
    /// ## Errors
    /// - `ItemNotFound` if the index is not on the bill
    /// - `Validation` if the new unit price or line total is negative or
    ///   above `MAX_EXPENSE_AMOUNT`
    pub fn correct_item_price(
        &mut self,
        index: usize,
        unit_price: Money,
        tolerance: Tolerance,
    ) -> CoreResult<()> {
        validate_bill_amount("price", unit_price)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.index == index)
            .ok_or(CoreError::ItemNotFound { index })?;

        let line_total = unit_price.multiply_quantity(i64::from(item.quantity));
        validate_bill_amount("price", line_total)?;

        item.unit_price = unit_price;
        item.price = line_total;

        self.refresh_discrepancy(tolerance);
        Ok(())
    }
}

// =============================================================================
// Splits
// =============================================================================

/// How one amount (an item, the tax, other charges, or a manual expense) is
/// divided among members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "splitType", rename_all = "camelCase")]
#[ts(export)]
pub enum SplitMode {
    /// Everyone listed pays `amount / members.len()`.
    Equal { members: Vec<MemberId> },
    /// Caller-supplied amount per member.
    Custom { amounts: BTreeMap<MemberId, Money> },
}

impl SplitMode {
    /// Convenience constructor for an equal split.
    pub fn equal<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        SplitMode::Equal {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Convenience constructor for a custom split.
    pub fn custom<I, M>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (M, Money)>,
        M: Into<MemberId>,
    {
        SplitMode::Custom {
            amounts: amounts.into_iter().map(|(m, a)| (m.into(), a)).collect(),
        }
    }

    /// Members participating in this split.
    pub fn member_ids(&self) -> Vec<&MemberId> {
        match self {
            SplitMode::Equal { members } => members.iter().collect(),
            SplitMode::Custom { amounts } => amounts.keys().collect(),
        }
    }

    /// True when nobody is assigned.
    pub fn is_empty(&self) -> bool {
        match self {
            SplitMode::Equal { members } => members.is_empty(),
            SplitMode::Custom { amounts } => amounts.is_empty(),
        }
    }
}

/// Assignment of one bill item to the members sharing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemSplit {
    pub item_index: usize,
    pub mode: SplitMode,
}

/// The reconciled amount one member owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinalSplit {
    pub member_id: MemberId,
    pub amount_owed: Money,
}

// =============================================================================
// Manual Expense
// =============================================================================

/// Details typed in on the manual (non-scan) flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManualExpense {
    pub title: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
