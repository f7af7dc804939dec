//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let database = match ctx.core.open_db() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not open database");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: "ok",
        database,
        version: crate::config::APP_VERSION,
    }))
}
