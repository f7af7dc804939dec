//! Dashboard analytics.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::workflow::{self, AnalyticsSummary};

/// `GET /api/analytics/summary`
pub async fn summary(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    auth.require(Page::Analytics)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::analytics_summary(&conn)?))
}
