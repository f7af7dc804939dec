//! Call records. Completing a call prices it in CU and completes the
//! linked assignment.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;
use crate::workflow;

const CALL_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Pm];

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<CallRecordFilter>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    auth.require(Page::Projects)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_call_records(&conn, &filter)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewCallRecord>,
) -> Result<Json<CallRecord>, ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(CALL_ROLES)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::create_call_record(&conn, &body, Some(auth.id()))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<CallRecordUpdate>,
) -> Result<Json<CallRecord>, ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(CALL_ROLES)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::update_call_record(&conn, &id, &body, Some(auth.id()))?))
}
