use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use vidchat_core::AppError;

use crate::error::HttpAppError;

/// JWT claims of a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// The authenticated user, stored in request extensions by the session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<SessionClaims> for UserSession {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

// Extracted from parts so it can sit next to Multipart and body extractors
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<UserSession>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthenticated(
                "Missing user session".to_string(),
            ))
        })
    }
}
