//! Legacy usage records and the CSV usage report.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;
use crate::reports::usage_csv::{usage_csv, usage_csv_filename};
use crate::workflow;

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<UsageFilter>,
) -> Result<Json<Vec<UsageReportRow>>, ApiError> {
    auth.require(Page::Usage)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_usage_report(&conn, &filter)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewUsageRecord>,
) -> Result<Json<UsageRecord>, ApiError> {
    auth.require(Page::Usage)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::record_usage(&conn, &body, Some(auth.id()))?))
}

/// `GET /api/usage/export`, same filters as the listing.
pub async fn export(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<UsageFilter>,
) -> Result<Response, ApiError> {
    auth.require(Page::Usage)?;
    let conn = ctx.core.open_db()?;
    let rows = db::list_usage_report(&conn, &filter)?;
    let filename = usage_csv_filename(db::now().date_naive());

    tracing::info!(rows = rows.len(), by = %auth.id(), "Usage exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        usage_csv(&rows),
    )
        .into_response())
}
