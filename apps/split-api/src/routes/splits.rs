//! Stateless split math.
//!
//! ```text
//! POST /api/splits/calculate
//!   { bill, members, itemSplits, taxSplit?, otherChargesSplit? }
//!         │
//!         ├── validate_item_splits + validate_charge_splits
//!         │        │
//!         │        └── invalid ──► { finalSplits: null, validation }
//!         ▼
//!   calculate_final_splits ──► { finalSplits: [...], validation }
//! ```

use std::collections::BTreeMap;

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use splitter_core::money::CUSTOM_SPLIT_TOLERANCE;
use splitter_core::types::{Bill, FinalSplit, ItemSplit, MemberId, SplitMode};
use splitter_core::validation::{validate_charge_splits, validate_item_splits};
use splitter_core::{calculate_final_splits, validate_custom_amounts, Money, Tolerance, ValidationReport};

use crate::auth::Session;
use crate::extract::ApiJson;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub bill: Bill,
    /// Group members in order; the last one absorbs rounding.
    pub members: Vec<MemberId>,
    pub item_splits: Vec<ItemSplit>,
    #[serde(default)]
    pub tax_split: Option<SplitMode>,
    #[serde(default)]
    pub other_charges_split: Option<SplitMode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    /// `None` while the assignments are incomplete.
    pub final_splits: Option<Vec<FinalSplit>>,
    pub validation: ValidationReport,
}

/// `POST /api/splits/calculate`
pub async fn calculate(
    session: Session,
    ApiJson(req): ApiJson<CalculateRequest>,
) -> ApiResult<Json<CalculateResponse>> {
    debug!(
        user_id = %session.user_id,
        members = req.members.len(),
        item_splits = req.item_splits.len(),
        "Calculating splits"
    );

    req.bill.validate_amounts()?;

    let mut validation = validate_item_splits(&req.bill, &req.item_splits);
    validation.merge(validate_charge_splits(
        &req.bill,
        req.tax_split.as_ref(),
        req.other_charges_split.as_ref(),
    ));

    if !validation.is_valid() {
        return Ok(Json(CalculateResponse {
            final_splits: None,
            validation,
        }));
    }

    let final_splits = calculate_final_splits(
        &req.bill,
        &req.members,
        &req.item_splits,
        req.tax_split.as_ref(),
        req.other_charges_split.as_ref(),
    )?;

    Ok(Json(CalculateResponse {
        final_splits: Some(final_splits),
        validation,
    }))
}

/// Custom amounts as typed into the split screen.
///
/// Unlike the other bodies, which carry `Money` as integer cents, every
/// number here is a decimal currency amount (`14.99`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCustomRequest {
    pub amounts: BTreeMap<MemberId, f64>,
    pub expected_total: f64,
    /// Defaults to one cent.
    #[serde(default)]
    pub tolerance: Option<f64>,
}

fn to_money(field: &str, value: f64) -> ApiResult<Money> {
    Money::from_decimal(value)
        .ok_or_else(|| ApiError::validation(format!("{field} must be a finite amount")))
}

/// `POST /api/splits/validate-custom`
pub async fn validate_custom(
    session: Session,
    ApiJson(req): ApiJson<ValidateCustomRequest>,
) -> ApiResult<Json<ValidationReport>> {
    let tolerance = match req.tolerance {
        None => CUSTOM_SPLIT_TOLERANCE,
        Some(value) => Tolerance::from_decimal(value)
            .ok_or_else(|| ApiError::validation("tolerance must be a non-negative number"))?,
    };

    let expected_total = to_money("expectedTotal", req.expected_total)?;
    let amounts = req
        .amounts
        .into_iter()
        .map(|(member, value)| Ok((member, to_money("amount", value)?)))
        .collect::<ApiResult<BTreeMap<MemberId, Money>>>()?;

    debug!(
        user_id = %session.user_id,
        members = amounts.len(),
        expected = %expected_total,
        tolerance = %tolerance,
        "Validating custom amounts"
    );

    Ok(Json(validate_custom_amounts(&amounts, expected_total, tolerance)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::NaiveDate;
    use serde_json::json;

    use splitter_core::money::DISCREPANCY_TOLERANCE;
    use splitter_core::types::{Bill, Item, ItemSplit, SplitMode};
    use splitter_core::Money;

    use crate::routes::test_support::{send, test_state, token};

    fn bill(items: &[i64], total: i64, tax: Option<i64>) -> Bill {
        Bill::new(
            "Diner",
            NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
            items
                .iter()
                .enumerate()
                .map(|(i, c)| Item::new(i, format!("Item {i}"), Money::from_cents(*c), 1))
                .collect(),
            tax.map(Money::from_cents),
            None,
            None,
            Money::from_cents(total),
            DISCREPANCY_TOLERANCE,
        )
    }

    #[tokio::test]
    async fn test_calculate_three_way_remainder() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let splits = vec![ItemSplit {
            item_index: 0,
            mode: SplitMode::equal(["a", "b", "c"]),
        }];
        let body = json!({
            "bill": bill(&[3100], 3100, None),
            "members": ["a", "b", "c"],
            "itemSplits": splits,
        });

        let (status, res) =
            send(&state, Method::POST, "/api/splits/calculate", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["validation"]["isValid"], true);
        let owed: Vec<i64> = res["finalSplits"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["amountOwed"].as_i64().unwrap())
            .collect();
        assert_eq!(owed, vec![1033, 1033, 1034]);
    }

    #[tokio::test]
    async fn test_calculate_reports_unassigned_tax() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let splits = vec![
            ItemSplit {
                item_index: 0,
                mode: SplitMode::equal(["a"]),
            },
            ItemSplit {
                item_index: 1,
                mode: SplitMode::equal(["b"]),
            },
        ];
        let body = json!({
            "bill": bill(&[1000, 2000], 3300, Some(300)),
            "members": ["a", "b"],
            "itemSplits": splits,
        });

        let (status, res) =
            send(&state, Method::POST, "/api/splits/calculate", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["validation"]["isValid"], false);
        assert!(res["finalSplits"].is_null());
    }

    #[tokio::test]
    async fn test_calculate_unknown_member_is_bad_request() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let splits = vec![ItemSplit {
            item_index: 0,
            mode: SplitMode::equal(["zed"]),
        }];
        let body = json!({
            "bill": bill(&[1000], 1000, None),
            "members": ["a"],
            "itemSplits": splits,
        });

        let (status, err) =
            send(&state, Method::POST, "/api/splits/calculate", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["message"].as_str().unwrap().contains("zed"));
    }

    #[tokio::test]
    async fn test_calculate_rejects_out_of_range_bill() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let mut bill = bill(&[1000, 2000], 3000, None);
        bill.items[0].unit_price = Money::from_cents(i64::MAX);
        bill.items[0].price = Money::from_cents(i64::MAX);
        bill.items[1].price = Money::from_cents(i64::MAX);
        let body = json!({
            "bill": bill,
            "members": ["a"],
            "itemSplits": [],
        });

        let (status, err) =
            send(&state, Method::POST, "/api/splits/calculate", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_validate_custom_off_by_a_cent_fails() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let body = json!({
            "amounts": { "A": 15, "B": 14.99 },
            "expectedTotal": 30
        });

        let (status, report) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(body),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["isValid"], false);
        assert!(!report["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_custom_reads_decimal_amounts() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let body = json!({
            "amounts": { "A": 15, "B": 15 },
            "expectedTotal": 30
        });

        let (status, report) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["isValid"], true);

        // 15 cents each would not add up to $30.00
        let body = json!({
            "amounts": { "A": 0.15, "B": 0.15 },
            "expectedTotal": 30
        });
        let (_, report) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(body),
        )
        .await;
        assert_eq!(report["isValid"], false);
    }

    #[tokio::test]
    async fn test_validate_custom_with_wider_tolerance() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let body = json!({
            "amounts": { "a": 15.0, "b": 14.99 },
            "expectedTotal": 30.0,
            "tolerance": 0.015
        });

        let (_, report) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(body),
        )
        .await;

        assert_eq!(report["isValid"], true);
    }

    #[tokio::test]
    async fn test_validate_custom_negative_tolerance_rejected() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let body = json!({
            "amounts": { "a": 15.0 },
            "expectedTotal": 15.0,
            "tolerance": -1.0
        });

        let (status, _) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(body),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
