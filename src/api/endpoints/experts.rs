//! Expert directory endpoints.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::{parse_id, Ack};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<ExpertFilter>,
) -> Result<Json<Vec<Expert>>, ApiError> {
    auth.require(Page::Experts)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_experts(&conn, &filter)?))
}

/// Experts added by an RA are always credited to that RA.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(mut body): Json<NewExpert>,
) -> Result<Json<Expert>, ApiError> {
    auth.require(Page::Experts)?;
    body.validate()?;
    if auth.role() == UserRole::Ra {
        body.sourced_by_ra_id = Some(auth.id());
    }

    let conn = ctx.core.open_db()?;
    if let Some(ra_id) = &body.sourced_by_ra_id {
        let is_ra = db::get_user(&conn, ra_id)?.is_some_and(|u| u.role == UserRole::Ra);
        if !is_ra {
            return Err(ApiError::Validation(ValidationError::new(
                "sourcedByRaId",
                "must reference an RA",
            )));
        }
    }

    let expert = db::insert_expert(&conn, &body)?;
    tracing::info!(expert_id = %expert.id, by = %auth.id(), "Expert created");
    Ok(Json(expert))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Expert>, ApiError> {
    auth.require(Page::Experts)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::require_expert(&conn, &id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ExpertUpdate>,
) -> Result<Json<Expert>, ApiError> {
    auth.require(Page::Experts)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_expert(&conn, &id, &body)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::Experts)?;
    auth.require_role(&[UserRole::Admin, UserRole::Pm])?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_expert(&conn, &id)?;
    tracing::info!(expert_id = %id, by = %auth.id(), "Expert deleted");
    Ok(Ack::done())
}
