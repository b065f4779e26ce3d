//! # Receipt Extraction Schema
//!
//! The typed JSON shape returned by the receipt-reading model, and its
//! conversion into a `Bill`.
//!
//! ```text
//! {
//!   "storeName": "Corner Deli",
//!   "date": "2026-03-14",
//!   "items": [ { "name": "Sandwich", "price": 8.99, "quantity": 1 } ],
//!   "taxes": 0.72,
//!   "otherCharges": null,
//!   "discount": null,
//!   "totalCost": 9.71
//! }
//! ```
//!
//! `price` is the unit price; `quantity` defaults to 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Tolerance};
use crate::types::{Bill, Item};
use crate::validation::{validate_bill_amount, validate_item_quantity};

/// One line item as extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtractedItem {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A whole receipt as extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtractedReceipt {
    pub store_name: String,
    pub date: String,
    pub items: Vec<ExtractedItem>,
    #[serde(default)]
    pub taxes: Option<f64>,
    #[serde(default)]
    pub other_charges: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    pub total_cost: f64,
}

fn to_money(field: &str, value: f64) -> CoreResult<Money> {
    Money::from_decimal(value).ok_or_else(|| CoreError::InvalidAmount {
        field: field.to_string(),
        reason: format!("{value} is not a representable amount"),
    })
}

/// Converts and range-checks one amount printed on the receipt.
fn to_bill_amount(field: &str, value: f64) -> CoreResult<Money> {
    let amount = to_money(field, value)?;
    validate_bill_amount(field, amount)?;
    Ok(amount)
}

fn to_optional_bill_amount(field: &str, value: Option<f64>) -> CoreResult<Option<Money>> {
    value.map(|v| to_bill_amount(field, v)).transpose()
}

impl Bill {
    /// Builds a bill from an extraction result.
    ///
    /// Converts every decimal to cents once, checks prices and quantities,
    /// and runs discrepancy detection.
    ///
    /// ## Errors
    /// - `InvalidAmount` for NaN/infinite amounts
    /// - `Validation` for negative amounts, amounts (including line totals)
    ///   above `MAX_EXPENSE_AMOUNT`, bad quantities, unparsable dates or a
    ///   blank store name
    ///
    /// ## Example
    /// ```rust
    /// use splitter_core::money::DISCREPANCY_TOLERANCE;
    /// use splitter_core::receipt::ExtractedReceipt;
    /// use splitter_core::types::Bill;
    ///
    /// let receipt: ExtractedReceipt = serde_json::from_str(r#"{
    ///     "storeName": "Corner Deli",
    ///     "date": "2026-03-14",
    ///     "items": [{ "name": "Soda", "price": 1.50, "quantity": 2 }],
    ///     "totalCost": 3.30
    /// }"#).unwrap();
    ///
    /// let bill = Bill::from_extraction(&receipt, DISCREPANCY_TOLERANCE).unwrap();
    /// assert_eq!(bill.items[0].price.cents(), 300);
    /// assert!(bill.discrepancy.flag);
    /// ```
    pub fn from_extraction(receipt: &ExtractedReceipt, tolerance: Tolerance) -> CoreResult<Bill> {
        let store_name = receipt.store_name.trim();
        if store_name.is_empty() {
            return Err(ValidationError::Required {
                field: "storeName".to_string(),
            }
            .into());
        }

        let date = NaiveDate::parse_from_str(receipt.date.trim(), "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }
        })?;

        let mut items = Vec::with_capacity(receipt.items.len());
        for (index, extracted) in receipt.items.iter().enumerate() {
            let unit_price = to_bill_amount("price", extracted.price)?;

            let quantity = extracted.quantity.unwrap_or(1);
            validate_item_quantity(quantity)?;

            let item = Item::new(index, extracted.name.trim(), unit_price, quantity);
            validate_bill_amount("price", item.price)?;
            items.push(item);
        }

        Ok(Bill::new(
            store_name,
            date,
            items,
            to_optional_bill_amount("taxes", receipt.taxes)?,
            to_optional_bill_amount("otherCharges", receipt.other_charges)?,
            to_optional_bill_amount("discount", receipt.discount)?,
            to_bill_amount("totalCost", receipt.total_cost)?,
            tolerance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::DISCREPANCY_TOLERANCE;

    fn receipt(json: &str) -> ExtractedReceipt {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_extraction_converts_once() {
        let r = receipt(
            r#"{
                "storeName": "Market",
                "date": "2026-02-01",
                "items": [
                    { "name": "Apples", "price": 0.1, "quantity": 3 },
                    { "name": "Milk", "price": 0.2 }
                ],
                "taxes": 0.05,
                "discount": 0.05,
                "totalCost": 0.5
            }"#,
        );
        let bill = Bill::from_extraction(&r, DISCREPANCY_TOLERANCE).unwrap();

        assert_eq!(bill.items.len(), 2);
        assert_eq!(bill.items[0].price.cents(), 30);
        assert_eq!(bill.items[1].quantity, 1);
        assert_eq!(bill.total_cost.cents(), 50);
        assert!(!bill.discrepancy.flag);
    }

    #[test]
    fn test_from_extraction_rejects_bad_input() {
        let bad_date = receipt(
            r#"{ "storeName": "X", "date": "14/03/2026", "items": [], "totalCost": 0 }"#,
        );
        assert!(matches!(
            Bill::from_extraction(&bad_date, DISCREPANCY_TOLERANCE),
            Err(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        let negative = receipt(
            r#"{ "storeName": "X", "date": "2026-03-14", "items": [{ "name": "A", "price": -1 }], "totalCost": 0 }"#,
        );
        assert!(Bill::from_extraction(&negative, DISCREPANCY_TOLERANCE).is_err());

        let zero_qty = receipt(
            r#"{ "storeName": "X", "date": "2026-03-14", "items": [{ "name": "A", "price": 1, "quantity": 0 }], "totalCost": 0 }"#,
        );
        assert!(Bill::from_extraction(&zero_qty, DISCREPANCY_TOLERANCE).is_err());

        let blank = receipt(r#"{ "storeName": " ", "date": "2026-03-14", "items": [], "totalCost": 0 }"#);
        assert!(Bill::from_extraction(&blank, DISCREPANCY_TOLERANCE).is_err());
    }

    #[test]
    fn test_from_extraction_rejects_amounts_out_of_range() {
        let huge_price = receipt(
            r#"{ "storeName": "X", "date": "2026-03-14", "items": [{ "name": "A", "price": 1e16, "quantity": 999 }], "totalCost": 1 }"#,
        );
        assert!(matches!(
            Bill::from_extraction(&huge_price, DISCREPANCY_TOLERANCE),
            Err(CoreError::Validation(ValidationError::AmountTooLarge { .. }))
        ));

        // Each unit price is in range but the line total is not
        let huge_line = receipt(
            r#"{ "storeName": "X", "date": "2026-03-14", "items": [{ "name": "A", "price": 500000, "quantity": 3 }], "totalCost": 1 }"#,
        );
        assert!(matches!(
            Bill::from_extraction(&huge_line, DISCREPANCY_TOLERANCE),
            Err(CoreError::Validation(ValidationError::AmountTooLarge { .. }))
        ));

        let huge_total = receipt(
            r#"{ "storeName": "X", "date": "2026-03-14", "items": [], "totalCost": 1e300 }"#,
        );
        assert!(Bill::from_extraction(&huge_total, DISCREPANCY_TOLERANCE).is_err());
    }

    #[test]
    fn test_from_extraction_rejects_negative_charges() {
        for field in ["taxes", "otherCharges", "discount"] {
            let json = format!(
                r#"{{ "storeName": "X", "date": "2026-03-14", "items": [{{ "name": "A", "price": 10 }}], "{field}": -1.5, "totalCost": 10 }}"#
            );
            let err = Bill::from_extraction(&receipt(&json), DISCREPANCY_TOLERANCE).unwrap_err();
            assert!(
                matches!(err, CoreError::Validation(ValidationError::InvalidFormat { field: ref f, .. }) if f == field),
                "{field}: {err:?}"
            );
        }
    }
}
