//! Admin session cookie validation.
//!
//! The back-office login flow (outside this service) issues a signed JWT in
//! an httpOnly `admin_session` cookie. Handlers behind the admin routes
//! extract [`AdminSession`], which verifies the signature, expiry, and the
//! admin role claim.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::ApiState;

/// Cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "admin_session";

/// Claims inside the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin user identifier.
    pub sub: String,
    /// Must be `"admin"` for the sync endpoints.
    pub role: String,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// A validated admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Admin user identifier from the token.
    pub subject: String,
}

/// Sign a session token. Used by the login flow and by tests.
pub fn issue_session_token(
    secret: &str,
    subject: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = SessionClaims {
        sub: subject.to_string(),
        role: "admin".to_string(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Pull one cookie value out of a `Cookie` header.
fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

/// Validate a session token against the shared secret.
fn validate_token(token: &str, secret: &str) -> Result<AdminSession, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!(error = %e, "Session token rejected");
        ApiError::Unauthorized
    })?;

    if data.claims.role != "admin" {
        return Err(ApiError::Unauthorized);
    }

    Ok(AdminSession {
        subject: data.claims.sub,
    })
}

#[async_trait]
impl FromRequestParts<ApiState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = cookie_value(cookies, SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
        validate_token(token, &state.secrets.session_secret)
    }
}
