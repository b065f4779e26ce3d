//! # Wizard Endpoints
//!
//! The server owns each user's `FlowState`; clients send actions and
//! render whatever comes back.
//!
//! ## Resume Across Devices
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /api/flow/actions                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cached flow? ── no ──► snapshot in SQLite? ── no ──► FlowState::new() │
//! │       │                        │                                        │
//! │      yes                      yes ──► FlowState::from_snapshot         │
//! │       │                        │                                        │
//! │       ▼                        ▼                                        │
//! │  reduce(state, action) ──► cache ──► upsert snapshot                   │
//! │                                                                         │
//! │  Reset deletes the snapshot instead of writing an empty one.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{debug, info};

use splitter_core::{reduce, FlowAction, FlowState, FlowStep};

use crate::auth::Session;
use crate::extract::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

/// What the client renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowView {
    pub current_step: FlowStep,
    pub steps: &'static [FlowStep],
    /// Why the flow cannot move forward, if it can't.
    pub blocked_reason: Option<String>,
    pub state: FlowState,
}

impl From<FlowState> for FlowView {
    fn from(state: FlowState) -> Self {
        FlowView {
            current_step: state.current_step(),
            steps: state.steps(),
            blocked_reason: state.can_proceed().err().map(|e| e.to_string()),
            state,
        }
    }
}

/// The user's flow as it should be if nothing is cached: restored from the
/// resume snapshot, or fresh.
pub(crate) async fn restore_flow(state: &AppState, user_id: &str) -> ApiResult<FlowState> {
    match state.db.snapshots().get(user_id).await? {
        Some(snapshot) => {
            let restored = FlowState::from_snapshot(&snapshot, &state.flow_context());
            info!(
                user_id = %user_id,
                step = %restored.current_step(),
                "Restored flow from snapshot"
            );
            Ok(restored)
        }
        None => Ok(FlowState::new()),
    }
}

/// Cached flow, else `restore_flow`. Only hits the database on a miss.
pub(crate) async fn load_flow(state: &AppState, user_id: &str) -> ApiResult<FlowState> {
    match state.sessions.get(user_id) {
        Some(flow) => Ok(flow),
        None => restore_flow(state, user_id).await,
    }
}

/// `GET /api/flow`
pub async fn current(State(state): State<AppState>, session: Session) -> ApiResult<Json<FlowView>> {
    debug!(user_id = %session.user_id, "Loading flow");

    let flow = match state.sessions.get(&session.user_id) {
        Some(flow) => flow,
        None => {
            let restored = restore_flow(&state, &session.user_id).await?;
            state.sessions.put(&session.user_id, restored.clone());
            restored
        }
    };

    Ok(Json(flow.into()))
}

/// `POST /api/flow/actions`
pub async fn apply_action(
    State(state): State<AppState>,
    session: Session,
    ApiJson(action): ApiJson<FlowAction>,
) -> ApiResult<Json<FlowView>> {
    let user_id = session.user_id.as_str();
    debug!(user_id = %user_id, action = ?action, "Applying flow action");

    let is_reset = matches!(action, FlowAction::Reset);
    let ctx = state.flow_context();
    let fallback = load_flow(&state, user_id).await?;

    let next = state
        .sessions
        .apply(user_id, fallback, |current| reduce(current, action, &ctx))?;

    let snapshots = state.db.snapshots();
    if is_reset {
        snapshots.delete(user_id).await?;
    } else {
        snapshots.upsert(user_id, &next.to_snapshot()).await?;
        info!(
            user_id = %user_id,
            step = %next.current_step(),
            "Flow snapshot saved"
        );
    }

    Ok(Json(next.into()))
}

/// `DELETE /api/flow`
pub async fn reset(State(state): State<AppState>, session: Session) -> ApiResult<Json<FlowView>> {
    let user_id = session.user_id.as_str();

    state.sessions.remove(user_id);
    let existed = state.db.snapshots().delete(user_id).await?;
    info!(user_id = %user_id, had_snapshot = existed, "Flow reset");

    Ok(Json(FlowState::new().into()))
}
