//! Request body extractor.
//!
//! ```text
//! body ──► axum::Json<T> ──► ok ──────────► ApiJson(T)
//!                 │
//!                 └── JsonRejection ──► 400 { code: "VALIDATION_ERROR", message }
//! ```
//!
//! Handlers take `ApiJson<T>` instead of `Json<T>` so a malformed body gets
//! the same error shape as every other failure.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body whose rejection is an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::routes::test_support::{send, test_state, token};
    use crate::state::AppState;

    async fn post_raw(
        state: &AppState,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token(state, "u1")));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = crate::build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_shape() {
        let state = test_state().await;

        let (status, err) =
            post_raw(&state, "/api/forms/validate", Some("application/json"), "{ not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
        assert!(err["message"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_field_type_uses_error_shape() {
        let state = test_state().await;
        let t = token(&state, "u1");

        let (status, err) = send(
            &state,
            Method::POST,
            "/api/splits/validate-custom",
            Some(&t),
            Some(serde_json::json!({ "amounts": { "A": "fifteen" }, "expectedTotal": 30 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_shape() {
        let state = test_state().await;

        let (status, err) =
            post_raw(&state, "/api/flow/actions", None, r#"{ "type": "next" }"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }
}
