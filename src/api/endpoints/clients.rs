//! Client organizations and their points of contact.

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

const DELETERS: &[UserRole] = &[UserRole::Admin, UserRole::Pm];

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PocQuery {
    pub organization_id: Option<Uuid>,
}

// ── Organizations ─────────────────────────────────────────

pub async fn list_organizations(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<Vec<ClientOrganization>>, ApiError> {
    auth.require(Page::Clients)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_client_organizations(&conn, query.search.as_deref())?))
}

pub async fn create_organization(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewClientOrganization>,
) -> Result<Json<ClientOrganization>, ApiError> {
    auth.require(Page::Clients)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::insert_client_organization(&conn, &body)?))
}

pub async fn get_organization(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ClientOrganization>, ApiError> {
    auth.require(Page::Clients)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::get_client_organization(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("client organization {id} not found")))
}

pub async fn update_organization(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ClientOrganizationUpdate>,
) -> Result<Json<ClientOrganization>, ApiError> {
    auth.require(Page::Clients)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_client_organization(&conn, &id, &body)?))
}

pub async fn delete_organization(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::Clients)?;
    auth.require_role(DELETERS)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_client_organization(&conn, &id)?;
    tracing::info!(organization_id = %id, by = %auth.id(), "Client organization deleted");
    Ok(Ack::done())
}

// ── Points of contact ─────────────────────────────────────

pub async fn list_pocs(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PocQuery>,
) -> Result<Json<Vec<ClientPoc>>, ApiError> {
    auth.require(Page::Clients)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_client_pocs(&conn, query.organization_id.as_ref())?))
}

pub async fn create_poc(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewClientPoc>,
) -> Result<Json<ClientPoc>, ApiError> {
    auth.require(Page::Clients)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    if db::get_client_organization(&conn, &body.organization_id)?.is_none() {
        return Err(ApiError::NotFound(format!(
            "client organization {} not found",
            body.organization_id
        )));
    }
    Ok(Json(db::insert_client_poc(&conn, &body)?))
}

pub async fn get_poc(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ClientPoc>, ApiError> {
    auth.require(Page::Clients)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::get_client_poc(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("client poc {id} not found")))
}

pub async fn update_poc(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ClientPocUpdate>,
) -> Result<Json<ClientPoc>, ApiError> {
    auth.require(Page::Clients)?;
    body.validate()?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_client_poc(&conn, &id, &body)?))
}

pub async fn delete_poc(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::Clients)?;
    auth.require_role(DELETERS)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::delete_client_poc(&conn, &id)?;
    Ok(Ack::done())
}
