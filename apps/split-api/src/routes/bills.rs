//! Receipt endpoints: turn an extraction into a `Bill`, fix misread prices.
//!
//! Both answer with the full bill so the client always renders the
//! discrepancy the server computed.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use splitter_core::receipt::ExtractedReceipt;
use splitter_core::types::Bill;
use splitter_core::Money;

use crate::auth::Session;
use crate::extract::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /api/bills/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    session: Session,
    ApiJson(receipt): ApiJson<ExtractedReceipt>,
) -> ApiResult<Json<Bill>> {
    debug!(
        user_id = %session.user_id,
        store = %receipt.store_name,
        items = receipt.items.len(),
        "Analyzing extracted receipt"
    );

    let bill = Bill::from_extraction(&receipt, state.tolerance())?;

    if bill.discrepancy.flag {
        info!(
            user_id = %session.user_id,
            total = %bill.total_cost,
            "Receipt has a discrepancy"
        );
    }

    Ok(Json(bill))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepriceRequest {
    pub bill: Bill,
    pub index: usize,
    /// New unit price in cents.
    pub price: Money,
}

/// `POST /api/bills/reprice`
pub async fn reprice(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<RepriceRequest>,
) -> ApiResult<Json<Bill>> {
    debug!(
        user_id = %session.user_id,
        index = req.index,
        price = %req.price,
        "Correcting item price"
    );

    let mut bill = req.bill;
    bill.validate_amounts()?;
    bill.correct_item_price(req.index, req.price, state.tolerance())?;

    Ok(Json(bill))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::routes::test_support::{send, test_state, token};

    fn receipt(total: f64) -> Value {
        json!({
            "storeName": "Corner Deli",
            "date": "2026-03-14",
            "items": [
                { "name": "Sandwich", "price": 10.0 },
                { "name": "Salad", "price": 20.0 }
            ],
            "totalCost": total
        })
    }

    #[tokio::test]
    async fn test_analyze_matching_total() {
        let state = test_state().await;
        let t = token(&state, "u1");

        let (status, bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(30.0)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(bill["discrepancy"]["flag"], false);
        assert_eq!(bill["items"][1]["price"], 2000);
    }

    #[tokio::test]
    async fn test_analyze_flags_discrepancy() {
        let state = test_state().await;
        let t = token(&state, "u1");

        let (status, bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(33.0)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(bill["discrepancy"]["flag"], true);
        let message = bill["discrepancy"]["message"].as_str().unwrap();
        assert!(message.contains("$3.00"), "{message}");
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_date() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let mut body = receipt(30.0);
        body["date"] = json!("14/03/2026");

        let (status, err) =
            send(&state, Method::POST, "/api/bills/analyze", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_requires_session() {
        let state = test_state().await;
        let (status, err) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            None,
            Some(receipt(30.0)),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_reprice_clears_discrepancy() {
        let state = test_state().await;
        let t = token(&state, "u1");

        let (_, bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(33.0)),
        )
        .await;
        assert_eq!(bill["discrepancy"]["flag"], true);

        let (status, fixed) = send(
            &state,
            Method::POST,
            "/api/bills/reprice",
            Some(&t),
            Some(json!({ "bill": bill, "index": 1, "price": 2300 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fixed["discrepancy"]["flag"], false);
        assert_eq!(fixed["items"][1]["unitPrice"], 2300);
    }

    #[tokio::test]
    async fn test_reprice_unknown_item() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let (_, bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(30.0)),
        )
        .await;

        let (status, _) = send(
            &state,
            Method::POST,
            "/api/bills/reprice",
            Some(&t),
            Some(json!({ "bill": bill, "index": 9, "price": 100 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_rejects_overflowing_line_total() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let mut body = receipt(30.0);
        body["items"] = json!([{ "name": "Misread", "price": 1e16, "quantity": 999 }]);

        let (status, err) =
            send(&state, Method::POST, "/api/bills/analyze", Some(&t), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reprice_rejects_tampered_bill() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let (_, mut bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(30.0)),
        )
        .await;
        bill["items"][0]["unitPrice"] = json!(i64::MAX);
        bill["items"][0]["price"] = json!(i64::MAX);
        bill["items"][1]["price"] = json!(i64::MAX);

        let (status, err) = send(
            &state,
            Method::POST,
            "/api/bills/reprice",
            Some(&t),
            Some(json!({ "bill": bill, "index": 1, "price": 2000 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reprice_rejects_negative_charge() {
        let state = test_state().await;
        let t = token(&state, "u1");
        let (_, mut bill) = send(
            &state,
            Method::POST,
            "/api/bills/analyze",
            Some(&t),
            Some(receipt(30.0)),
        )
        .await;
        bill["tax"] = json!(-300);

        let (status, _) = send(
            &state,
            Method::POST,
            "/api/bills/reprice",
            Some(&t),
            Some(json!({ "bill": bill, "index": 1, "price": 2000 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
