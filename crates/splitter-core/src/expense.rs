//! # Expense Payload
//!
//! Converts reconciled splits into the form fields of the expense-sharing
//! service's "create expense" call.
//!
//! ```text
//! cost                     "31.00"
//! description              "Luigi's"
//! date                     "2026-05-01"
//! group_id                 "4471"
//! users__0__user_id        "a"      (payer)
//! users__0__paid_share     "31.00"
//! users__0__owed_share     "10.33"
//! users__1__user_id        "b"
//! users__1__paid_share     "0.00"
//! users__1__owed_share     "10.33"
//! ...
//! ```
//!
//! The payer pays the whole cost. A payer who owes nothing is still listed,
//! with an owed share of zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{FinalSplit, MemberId};

/// One participant line of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseShare {
    pub user_id: MemberId,
    pub paid_share: Money,
    pub owed_share: Money,
}

/// A ready-to-send expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpensePayload {
    pub cost: Money,
    pub description: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub group_id: String,
    pub users: Vec<ExpenseShare>,
}

impl ExpensePayload {
    /// Flattens into `(key, value)` form fields, amounts as plain decimals.
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("cost".to_string(), self.cost.decimal_string()),
            ("description".to_string(), self.description.clone()),
            ("date".to_string(), self.date.format("%Y-%m-%d").to_string()),
            ("group_id".to_string(), self.group_id.clone()),
        ];

        for (i, user) in self.users.iter().enumerate() {
            fields.push((format!("users__{i}__user_id"), user.user_id.to_string()));
            fields.push((format!("users__{i}__paid_share"), user.paid_share.decimal_string()));
            fields.push((format!("users__{i}__owed_share"), user.owed_share.decimal_string()));
        }

        fields
    }
}

/// Builds the payload for `splits`, with `payer` paying `total`.
///
/// The payer is listed first.
///
/// ## Errors
/// - `NoMembers` if `splits` is empty
/// - `InvalidAmount` if the splits do not sum to `total`
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use splitter_core::expense::build_expense_payload;
/// use splitter_core::money::Money;
/// use splitter_core::types::{FinalSplit, MemberId};
///
/// let splits = vec![
///     FinalSplit { member_id: MemberId::new("a"), amount_owed: Money::from_cents(500) },
///     FinalSplit { member_id: MemberId::new("b"), amount_owed: Money::from_cents(500) },
/// ];
/// let payload = build_expense_payload(
///     "Lunch",
///     NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
///     "g1",
///     &MemberId::new("p"),
///     Money::from_cents(1000),
///     &splits,
/// ).unwrap();
///
/// assert_eq!(payload.users.len(), 3);
/// assert_eq!(payload.users[0].owed_share, Money::zero());
/// ```
pub fn build_expense_payload(
    description: &str,
    date: NaiveDate,
    group_id: &str,
    payer: &MemberId,
    total: Money,
    splits: &[FinalSplit],
) -> CoreResult<ExpensePayload> {
    if splits.is_empty() {
        return Err(CoreError::NoMembers {
            target: description.to_string(),
        });
    }

    let owed: Money = splits.iter().map(|s| s.amount_owed).sum();
    if owed != total {
        return Err(CoreError::InvalidAmount {
            field: "splits".to_string(),
            reason: format!("owed shares total {owed}, expected {total}"),
        });
    }

    let payer_owes = splits
        .iter()
        .find(|s| &s.member_id == payer)
        .map(|s| s.amount_owed)
        .unwrap_or_default();

    let mut users = vec![ExpenseShare {
        user_id: payer.clone(),
        paid_share: total,
        owed_share: payer_owes,
    }];
    users.extend(
        splits
            .iter()
            .filter(|s| &s.member_id != payer)
            .map(|s| ExpenseShare {
                user_id: s.member_id.clone(),
                paid_share: Money::zero(),
                owed_share: s.amount_owed,
            }),
    );

    Ok(ExpensePayload {
        cost: total,
        description: description.to_string(),
        date,
        group_id: group_id.to_string(),
        users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(id: &str, cents: i64) -> FinalSplit {
        FinalSplit {
            member_id: MemberId::new(id),
            amount_owed: Money::from_cents(cents),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    #[test]
    fn test_payer_among_debtors() {
        let splits = vec![split("a", 1033), split("b", 1033), split("c", 1034)];
        let payload = build_expense_payload(
            "Luigi's",
            date(),
            "4471",
            &MemberId::new("b"),
            Money::from_cents(3100),
            &splits,
        )
        .unwrap();

        assert_eq!(payload.users.len(), 3);
        assert_eq!(payload.users[0].user_id, MemberId::new("b"));
        assert_eq!(payload.users[0].paid_share.cents(), 3100);
        assert_eq!(payload.users[0].owed_share.cents(), 1033);

        let fields = payload.to_form_fields();
        assert!(fields.contains(&("cost".to_string(), "31.00".to_string())));
        assert!(fields.contains(&("users__2__owed_share".to_string(), "10.34".to_string())));
        assert!(fields.contains(&("users__1__paid_share".to_string(), "0.00".to_string())));
        assert!(fields.contains(&("date".to_string(), "2026-05-01".to_string())));
    }

    #[test]
    fn test_rejects_mismatched_total_and_empty() {
        let splits = vec![split("a", 100)];
        assert!(build_expense_payload("x", date(), "g", &MemberId::new("a"), Money::from_cents(101), &splits).is_err());
        assert!(build_expense_payload("x", date(), "g", &MemberId::new("a"), Money::from_cents(0), &[]).is_err());
    }
}
