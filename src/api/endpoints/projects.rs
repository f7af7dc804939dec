//! Project endpoints, including the activity feed and shortlist export.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use super::{parse_id, Ack};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;
use crate::reports::shortlist::{load_shortlist, render_shortlist_pdf, shortlist_filename};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Vec<Project>>, ApiError> {
    auth.require(Page::Projects)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_projects(&conn, &filter)?))
}

/// A PM creating a project without naming a PM owns it.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(mut body): Json<NewProject>,
) -> Result<Json<Project>, ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(&[UserRole::Admin, UserRole::Pm])?;
    body.validate()?;
    if body.pm_id.is_none() && auth.role() == UserRole::Pm {
        body.pm_id = Some(auth.id());
    }

    let conn = ctx.core.open_db()?;
    let project = db::insert_project(&conn, &body)?;
    tracing::info!(project_id = %project.id, by = %auth.id(), "Project created");
    Ok(Json(project))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetail>, ApiError> {
    auth.require(Page::Projects)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::get_project_detail(&conn, &id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(&[UserRole::Admin, UserRole::Pm])?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_project(&conn, &id, &body)?))
}

/// Cascades to the project's assignments, questions and calls.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::Projects)?;
    auth.require_role(&[UserRole::Admin, UserRole::Pm])?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_project(&conn, &id)?;
    tracing::info!(project_id = %id, by = %auth.id(), "Project deleted");
    Ok(Ack::done())
}

pub async fn activity(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ProjectActivity>>, ApiError> {
    auth.require(Page::Projects)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::require_project(&conn, &id)?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(db::list_project_activity(&conn, &id, limit)?))
}

/// `GET /api/projects/:id/shortlist.pdf`
pub async fn shortlist_pdf(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    auth.require(Page::Projects)?;
    let id = parse_id(&id)?;

    let shortlist = {
        let conn = ctx.core.open_db()?;
        load_shortlist(&conn, &id, db::now().date_naive())?
    };
    let filename = shortlist_filename(&shortlist.project_name);
    let bytes = tokio::task::spawn_blocking(move || render_shortlist_pdf(&shortlist))
        .await
        .map_err(|e| ApiError::Internal(format!("pdf task: {e}")))??;

    tracing::info!(project_id = %id, size = bytes.len(), "Shortlist exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
