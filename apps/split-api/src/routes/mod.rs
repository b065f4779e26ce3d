//! # Routes Module
//!
//! HTTP handlers, grouped by feature.
//!
//! ## Route Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         split-api Routes                                │
//! │                                                                         │
//! │  Public                                                                 │
//! │  └── GET    /health                       health::health               │
//! │                                                                         │
//! │  Stateless math (bearer session)                                       │
//! │  ├── POST   /api/bills/analyze            bills::analyze               │
//! │  ├── POST   /api/bills/reprice            bills::reprice               │
//! │  ├── POST   /api/splits/calculate         splits::calculate            │
//! │  ├── POST   /api/splits/validate-custom   splits::validate_custom      │
//! │  └── POST   /api/forms/validate           forms::validate              │
//! │                                                                         │
//! │  Wizard (bearer session, per-user state)                               │
//! │  ├── GET    /api/flow                     flow::current                │
//! │  ├── POST   /api/flow/actions             flow::apply_action           │
//! │  ├── DELETE /api/flow                     flow::reset                  │
//! │  ├── POST   /api/expenses                 expenses::finalize           │
//! │  ├── GET    /api/expenses/history         expenses::history            │
//! │  └── GET    /api/expenses/history/{id}    expenses::history_entry      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `/api` handler takes a [`Session`](crate::auth::Session) extractor,
//! so a missing or invalid token is rejected before the body is read.

pub mod bills;
pub mod expenses;
pub mod flow;
pub mod forms;
pub mod health;
pub mod splits;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All routes, waiting for state.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/bills/analyze", post(bills::analyze))
        .route("/api/bills/reprice", post(bills::reprice))
        .route("/api/splits/calculate", post(splits::calculate))
        .route("/api/splits/validate-custom", post(splits::validate_custom))
        .route("/api/forms/validate", post(forms::validate))
        .route(
            "/api/flow",
            get(flow::current).delete(flow::reset),
        )
        .route("/api/flow/actions", post(flow::apply_action))
        .route("/api/expenses", post(expenses::finalize))
        .route("/api/expenses/history", get(expenses::history))
        .route("/api/expenses/history/{id}", get(expenses::history_entry))
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use splitter_db::{Database, DbConfig};

    use crate::config::ApiConfig;
    use crate::state::AppState;

    pub async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig {
            jwt_secret: "test-secret".to_string(),
            ..ApiConfig::default()
        };
        AppState::new(db, config)
    }

    pub fn token(state: &AppState, user_id: &str) -> String {
        state.issuer.issue(user_id).unwrap()
    }

    /// Sends one request through a fresh router over `state`.
    pub async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app: Router = crate::build_router(state.clone());

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
