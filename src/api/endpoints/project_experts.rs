//! Assignment pipeline: assign, invite, edit, select, schedule, remove.
//!
//! Finance can read assignments but never move them.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;

use super::{parse_id, Ack};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;
use crate::workflow;

const PIPELINE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Pm, UserRole::Ra];
const CLIENT_FACING_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Pm];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCall {
    pub project_expert: ProjectExpert,
    pub call_record: CallRecord,
}

fn writer(auth: &AuthUser, roles: &[UserRole]) -> Result<(), ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(roles)
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<ProjectExpertFilter>,
) -> Result<Json<Vec<ProjectExpert>>, ApiError> {
    auth.require(Page::Projects)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_project_experts(&conn, &filter)?))
}

pub async fn assign(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewProjectExpert>,
) -> Result<Json<ProjectExpert>, ApiError> {
    writer(&auth, PIPELINE_ROLES)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::assign_expert(&conn, &body, Some(auth.id()))?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ProjectExpertUpdate>,
) -> Result<Json<ProjectExpert>, ApiError> {
    writer(&auth, PIPELINE_ROLES)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::update_assignment(&conn, &id, &body, Some(auth.id()))?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    writer(&auth, PIPELINE_ROLES)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    workflow::remove_assignment(&conn, &id, Some(auth.id()))?;
    Ok(Ack::done())
}

/// `POST /api/project-experts/:id/invite`. The returned assignment carries
/// the quick-invite token to share with the expert.
pub async fn invite(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProjectExpert>, ApiError> {
    writer(&auth, PIPELINE_ROLES)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::invite_expert(&conn, &id, Some(auth.id()))?))
}

pub async fn select(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProjectExpert>, ApiError> {
    writer(&auth, CLIENT_FACING_ROLES)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::select_expert(&conn, &id, Some(auth.id()))?))
}

pub async fn schedule(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ScheduleCall>,
) -> Result<Json<ScheduledCall>, ApiError> {
    writer(&auth, CLIENT_FACING_ROLES)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let (project_expert, call_record) = workflow::schedule_call(&conn, &id, &body, Some(auth.id()))?;
    Ok(Json(ScheduledCall {
        project_expert,
        call_record,
    }))
}
