//! Audit logging middleware.
//!
//! Logs every staff API request with user id, method, path and response
//! status. Runs innermost (after auth has injected `AuthUser`).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AuthUser;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id().to_string())
        .unwrap_or_default();

    let response = next.run(req).await;

    tracing::info!(
        target: "audit",
        %method,
        %path,
        status = response.status().as_u16(),
        user_id,
        "API access"
    );
    response
}
