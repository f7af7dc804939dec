//! Per-project vetting questions.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::{parse_id, Ack};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub project_id: Option<Uuid>,
}

/// Ordered by position within each project.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<Vec<VettingQuestion>>, ApiError> {
    auth.require(Page::VettingQuestions)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_vetting_questions(&conn, query.project_id.as_ref())?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewVettingQuestion>,
) -> Result<Json<VettingQuestion>, ApiError> {
    auth.require(Page::VettingQuestions)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    db::require_project(&conn, &body.project_id)?;
    Ok(Json(db::insert_vetting_question(&conn, &body)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<VettingQuestionUpdate>,
) -> Result<Json<VettingQuestion>, ApiError> {
    auth.require(Page::VettingQuestions)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_vetting_question(&conn, &id, &body)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::VettingQuestions)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_vetting_question(&conn, &id)?;
    Ok(Ack::done())
}
