//! # Session Tokens
//!
//! Every `/api` route identifies the Splitwise user through a bearer token
//! signed by this server.
//!
//! ```text
//! OAuth callback (out of scope) ──► SessionIssuer::issue(user_id) ──► token
//!
//! Authorization: Bearer <token>
//!         │
//!         ▼
//! Session extractor ──► SessionIssuer::verify ──► Session { user_id }
//!         │                    │
//!         │                    └── expired / forged ──► 401 UNAUTHORIZED
//!         └── header missing ─────────────────────────► 401 UNAUTHORIZED
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::state::AppState;

/// Session token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (Splitwise user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Why a request could not be authenticated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Could not issue session token: {0}")]
    Issue(String),
}

/// Issues and checks session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        SessionIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Signs a token for `user_id`.
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.lifetime_secs,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        let token = extract_bearer_token(header).ok_or(AuthError::MalformedHeader)?;
        let claims = state.issuer.verify(token)?;

        Ok(Session { user_id: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = SessionIssuer::new("test-secret", 3600);
        let token = issuer.issue("user-42").unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = SessionIssuer::new("one", 3600).issue("user-42").unwrap();
        let result = SessionIssuer::new("two", 3600).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token() {
        // Past the default 60s leeway
        let issuer = SessionIssuer::new("test-secret", -120);
        let token = issuer.issue("user-42").unwrap();
        assert_eq!(issuer.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
