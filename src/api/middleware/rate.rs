//! Sliding-window rate limiting.
//!
//! Staff requests are keyed by bearer token prefix (100/min, 1000/h).
//! Public invitation requests are keyed by the invitation token in the path.

use std::sync::{Arc, Mutex};

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, RateLimiter};

/// Extract a rate-limit key from the request.
fn rate_key(req: &Request<axum::body::Body>) -> String {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| {
            let prefix: String = token.chars().take(16).collect();
            format!("token:{prefix}")
        })
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Key for `/expert-invite/:token/...` and `/quick-invite/:token/...`.
fn invite_key(req: &Request<axum::body::Body>) -> String {
    let mut segments = req.uri().path().split('/').filter(|s| !s.is_empty());
    let kind = segments.next().unwrap_or("invite");
    let token = segments.next().unwrap_or("");
    format!("{kind}:{token}")
}

fn check(limiter: &Arc<Mutex<RateLimiter>>, key: &str) -> Result<(), ApiError> {
    let mut limiter = limiter
        .lock()
        .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;
    limiter.check(key).map_err(|retry_after| {
        tracing::warn!(key, retry_after, "Rate limit exceeded");
        ApiError::RateLimited { retry_after }
    })
}

fn context(req: &Request<axum::body::Body>) -> Result<ApiContext, ApiError> {
    req.extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))
}

/// Per-session rate limiting for staff routes. Returns 429 if exceeded.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    let checked = context(&req).and_then(|ctx| check(&ctx.rate_limiter, &rate_key(&req)));
    match checked {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

/// Per-token rate limiting for the public invitation pages.
pub async fn limit_invite(req: Request<axum::body::Body>, next: Next) -> Response {
    let checked = context(&req).and_then(|ctx| check(&ctx.invite_limiter, &invite_key(&req)));
    match checked {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}
