//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in split-api                              │
//! │                                                                         │
//! │  Handler -> Result<Json<T>, ApiError>                                  │
//! │       │                                                                 │
//! │       ├── DbError ──────── logged, generic message ───► 500 / 404      │
//! │       ├── CoreError ────── programmer / blocking ─────► 400 / 422      │
//! │       ├── FlowError ────── illegal transition ────────► 409 / 400      │
//! │       └── AuthError ────── bad or missing session ────► 401            │
//! │                                                                         │
//! │  Client receives:                                                      │
//! │    { "code": "FINALIZATION_BLOCKED", "message": "..." }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation problems on a form are NOT errors here: the validate
//! endpoints answer 200 with a `ValidationReport`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

use splitter_core::{CoreError, FlowError};
use splitter_db::DbError;

use crate::auth::AuthError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Expense not found: 6f1c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing or invalid session (401)
    Unauthorized,

    /// Action not legal on the current step (409)
    InvalidTransition,

    /// Expense cannot be submitted yet (422)
    FinalizationBlocked,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidTransition => StatusCode::CONFLICT,
            ErrorCode::FinalizationBlocked => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                error!(field = %field, value = %value, "Unique constraint violated");
                ApiError::new(ErrorCode::DatabaseError, "Record already exists")
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Serialization(e) => {
                error!("Stored record is malformed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Stored data could not be read")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::FinalizationBlocked { .. } => {
                ApiError::new(ErrorCode::FinalizationBlocked, err.to_string())
            }
            CoreError::ItemNotFound { .. }
            | CoreError::NoMembers { .. }
            | CoreError::UnknownMember { .. }
            | CoreError::UnassignedCharge { .. }
            | CoreError::InvalidAmount { .. }
            | CoreError::Validation(_) => ApiError::validation(err.to_string()),
        }
    }
}

/// Converts flow reducer errors to API errors.
impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Core(core) => core.into(),
            FlowError::Invalid { .. } => ApiError::validation(err.to_string()),
            FlowError::WrongStep { .. }
            | FlowError::CannotProceed { .. }
            | FlowError::AtStart
            | FlowError::Completed => ApiError::new(ErrorCode::InvalidTransition, err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Issue(e) => {
                error!("Session token signing failed: {}", e);
                ApiError::internal("Could not issue session")
            }
            other => {
                warn!(reason = %other, "Rejected request");
                ApiError::new(ErrorCode::Unauthorized, other.to_string())
            }
        }
    }
}

/// Converts body rejections (bad JSON, wrong content type) to API errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "Rejected request body");
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use splitter_core::FlowStep;

    #[test]
    fn test_db_not_found_maps_to_404() {
        let api: ApiError = DbError::not_found("Expense", "x1").into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert_eq!(api.message, "Expense not found: x1");
        assert_eq!(api.code.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_db_query_failure_is_generic() {
        let api: ApiError = DbError::QueryFailed("syntax error near SELECT".into()).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert!(!api.message.contains("SELECT"));
    }

    #[test]
    fn test_blocked_finalization_is_422() {
        let api: ApiError = FlowError::Core(CoreError::FinalizationBlocked {
            reasons: vec!["No group selected".into()],
        })
        .into();
        assert_eq!(api.code, ErrorCode::FinalizationBlocked);
        assert_eq!(api.code.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.message.contains("No group selected"));
    }

    #[test]
    fn test_wrong_step_is_conflict() {
        let api: ApiError = FlowError::WrongStep {
            action: "assignItem",
            step: FlowStep::Review,
        }
        .into();
        assert_eq!(api.code, ErrorCode::InvalidTransition);
        assert_eq!(api.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_serialized_code_is_screaming_snake_case() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::FinalizationBlocked, "x")).unwrap();
        assert_eq!(json["code"], "FINALIZATION_BLOCKED");
        assert_eq!(json["message"], "x");
    }
}
