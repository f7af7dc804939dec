//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it to a live session
//! of an active user, and injects `AuthUser` into request extensions for
//! downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::crypto::hash_token;
use crate::db::{self, now};

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

/// Bearer token of the request, if any.
pub fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token_hash = hash_token(bearer_token(&req).ok_or(ApiError::Unauthorized)?);

    let user = {
        let conn = ctx.core.open_db()?;
        let user_id = db::find_session_user(&conn, &token_hash, now())?
            .ok_or(ApiError::Unauthorized)?;
        db::get_user(&conn, &user_id)?
            .filter(|u| u.is_active)
            .ok_or(ApiError::Unauthorized)?
    }; // Connection dropped here, before any .await

    req.extensions_mut().insert(AuthUser { user, token_hash });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}
