//! Manual expense form validation.

use axum::extract::State;
use axum::Json;
use tracing::debug;

use splitter_core::validation::{validate_expense_form, ExpenseForm};
use splitter_core::ValidationReport;

use crate::auth::Session;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `POST /api/forms/validate`
///
/// A well-formed but invalid form is a 200 report, not an error.
pub async fn validate(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Json<ValidationReport> {
    let report = validate_expense_form(&form, state.flow_context().today);

    debug!(
        user_id = %session.user_id,
        valid = report.is_valid(),
        errors = report.errors().len(),
        "Validated expense form"
    );

    Json(report)
}
