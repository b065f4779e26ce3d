//! # Expense Finalization & History
//!
//! ```text
//! POST /api/expenses
//!   │
//!   │  one FlowSessions::transition (under the lock)
//!   │  ┌─────────────────────────────────────────────────────────────────┐
//!   │  │ Review ──► reduce(Next) ──► blocking checks + reconcile         │
//!   │  │                 │                                               │
//!   │  │                 └── blocked ──► 422 FINALIZATION_BLOCKED        │
//!   │  │ Finalize ──► build_expense_payload(payer = caller)              │
//!   │  │          ──► reduce(Next) ──► Success                           │
//!   │  └─────────────────────────────────────────────────────────────────┘
//!   ▼
//! history.record(...) ── failed ──► flow put back on Finalize
//!   │
//!   ▼
//! snapshot deleted
//! ```
//!
//! The returned payload is what gets posted to Splitwise's
//! `create_expense`; the caller pays the full cost and every member owes
//! their reconciled share.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use splitter_core::expense::{build_expense_payload, ExpensePayload};
use splitter_core::types::MemberId;
use splitter_core::{reduce, FlowAction, FlowContext, FlowError, FlowState, FlowStep};
use splitter_db::{DbError, ExpenseRecord};

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::routes::flow::load_flow;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    /// History record id.
    pub expense_id: String,
    pub payload: ExpensePayload,
    /// `payload` flattened into Splitwise form fields.
    pub form_fields: Vec<(String, String)>,
}

/// Moves the flow onto Finalize, computing final splits if it is on Review.
fn enter_finalize(flow: FlowState, ctx: &FlowContext) -> Result<FlowState, FlowError> {
    let flow = match flow.current_step() {
        FlowStep::Review => reduce(flow, FlowAction::Next, ctx)?,
        _ => flow,
    };

    match flow.current_step() {
        FlowStep::Finalize => Ok(flow),
        step => Err(FlowError::WrongStep {
            action: "finalize",
            step,
        }),
    }
}

/// Everything needed to record the expense, pulled out of a Finalize-step flow.
fn record_for(flow: &FlowState, user_id: &str) -> ApiResult<ExpenseRecord> {
    let (Some(flow_type), Some(group), Some(total), Some(description), Some(date), Some(splits)) = (
        flow.flow_type,
        flow.group.as_ref(),
        flow.total(),
        flow.description(),
        flow.date(),
        flow.final_splits.as_ref(),
    ) else {
        return Err(ApiError::internal("Finalized flow is missing expense data"));
    };

    Ok(ExpenseRecord::new(
        user_id,
        flow_type,
        group.id.clone(),
        description,
        date,
        total,
        flow.bill.clone(),
        splits.clone(),
    ))
}

/// `POST /api/expenses`
///
/// The flow moves to Success under the session lock, before the history
/// write, so a second request racing this one sees Success and is rejected.
/// If the write fails the flow goes back to Finalize and can be retried.
pub async fn finalize(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<FinalizeResponse>> {
    let user_id = session.user_id.as_str();
    debug!(user_id = %user_id, "Finalizing expense");

    let ctx = state.flow_context();
    let fallback = load_flow(&state, user_id).await?;
    let (finalizing, record, payload) =
        state.sessions.transition(user_id, fallback, |flow| -> ApiResult<_> {
            let finalizing = enter_finalize(flow, &ctx)?;
            let record = record_for(&finalizing, user_id)?;
            let payload = build_expense_payload(
                &record.description,
                record.expense_date,
                &record.group_id,
                &MemberId::new(user_id),
                record.total,
                &record.splits,
            )?;
            let done = reduce(finalizing.clone(), FlowAction::Next, &ctx)?;
            Ok((done, (finalizing, record, payload)))
        })?;

    if let Err(e) = state.db.history().record(&record).await {
        warn!(user_id = %user_id, error = %e, "History write failed, flow kept on finalize");
        state.sessions.put(user_id, finalizing);
        return Err(e.into());
    }

    state.db.snapshots().delete(user_id).await?;

    info!(
        user_id = %user_id,
        expense_id = %record.id,
        total = %record.total.format_with(&state.config.currency_symbol),
        members = record.splits.len(),
        "Expense finalized"
    );

    Ok(Json(FinalizeResponse {
        expense_id: record.id,
        form_fields: payload.to_form_fields(),
        payload,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// `GET /api/expenses/history?limit=N`, newest first.
pub async fn history(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ExpenseRecord>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    debug!(user_id = %session.user_id, limit = limit, "Listing history");

    let records = state.db.history().list_for_user(&session.user_id, limit).await?;
    Ok(Json(records))
}

/// `GET /api/expenses/history/{id}`
///
/// Another user's record is reported as not found.
pub async fn history_entry(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<ExpenseRecord>> {
    let found = state.db.history().get(&id).await?;
    match found {
        Some(record) if record.user_id == session.user_id => Ok(Json(record)),
        _ => Err(DbError::not_found("Expense", id).into()),
    }
}
