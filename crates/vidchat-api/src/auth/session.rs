use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use vidchat_core::constants::SESSION_COOKIE;
use vidchat_core::AppError;

use super::models::{SessionClaims, UserSession};

/// Resolves the caller's session from request headers.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns `AppError::Unauthenticated` when there is no valid session
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserSession, AppError>;
}

/// Verifies HS256 session tokens issued by the auth service.
///
/// The token is read from `Authorization: Bearer ...`, falling back to the
/// `session-token` cookie.
pub struct JwtSessionResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserSession, AppError> {
        let token = bearer_token(headers)
            .or_else(|| cookie_token(headers))
            .ok_or_else(|| AppError::Unauthenticated("Missing session token".to_string()))?;

        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            AppError::Unauthenticated(format!("Invalid session token: {}", e))
        })?;

        Ok(data.claims.into())
    }
}
