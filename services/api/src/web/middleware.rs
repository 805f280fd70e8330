//! services/api/src/web/middleware.rs
//!
//! Authentication and role middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use course_market_core::domain::Role;
use std::sync::Arc;
use tracing::warn;

use crate::auth::AuthUser;
use crate::web::protocol::ApiFailure;
use crate::web::state::AppState;

/// Middleware that validates the `Authorization: Bearer` header and
/// extracts the caller's identity.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers
/// to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    // 1. Extract the bearer token from the Authorization header.
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiFailure::Unauthorized("Missing bearer token".to_string()))?;

    // 2. Verify the signature and expiry.
    let user = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiFailure::Unauthorized("Invalid or expired token".to_string())
    })?;

    // 3. Insert the identity into request extensions.
    req.extensions_mut().insert(user);

    // 4. Continue to the handler.
    Ok(next.run(req).await)
}

/// Middleware layered after [`require_auth`] on teacher-only routes.
/// Rejects callers whose token does not carry the teacher role.
pub async fn require_teacher(req: Request, next: Next) -> Result<Response, ApiFailure> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiFailure::Unauthorized("Missing bearer token".to_string()))?;

    if user.role != Role::Teacher {
        return Err(ApiFailure::Forbidden(
            "This action requires a teacher account".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
