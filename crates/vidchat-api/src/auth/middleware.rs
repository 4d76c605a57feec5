use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::session::SessionResolver;
use crate::error::HttpAppError;

/// Resolve the session before the handler runs; the request body is never read
/// for unauthenticated callers.
pub async fn session_middleware(
    State(resolver): State<Arc<dyn SessionResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolver.resolve(request.headers()).await {
        Ok(session) => {
            tracing::debug!(user_id = %session.user_id, "Session resolved");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}
