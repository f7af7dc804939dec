//! Staff management of shareable invitation links.
//!
//! RAs only see and issue their own links.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::db;
use crate::models::*;
use crate::workflow;

fn visible_to(auth: &AuthUser, link: &InvitationLink) -> bool {
    auth.role() != UserRole::Ra || link.ra_id == Some(auth.id()) || link.created_by == Some(auth.id())
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<InvitationLinkFilter>,
) -> Result<Json<Vec<InvitationLink>>, ApiError> {
    auth.require(Page::InvitationLinks)?;
    let conn = ctx.core.open_db()?;
    let links = db::list_invitation_links(&conn, &filter)?
        .into_iter()
        .filter(|link| visible_to(&auth, link))
        .collect();
    Ok(Json(links))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(mut body): Json<NewInvitationLink>,
) -> Result<Json<InvitationLink>, ApiError> {
    auth.require(Page::InvitationLinks)?;
    body.validate()?;
    if auth.role() == UserRole::Ra {
        if body.ra_id.is_some_and(|id| id != auth.id()) {
            return Err(ApiError::Forbidden);
        }
        if body.invite_type == InviteType::Ra {
            body.ra_id = Some(auth.id());
        }
    }

    let conn = ctx.core.open_db()?;
    let link = workflow::create_link(
        &conn,
        &body,
        Some(auth.id()),
        ctx.core.config.invitations.link_ttl_days,
    )?;
    Ok(Json(link))
}

/// `GET /api/invitation-links/:key`, where `key` is the link id or its token.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<InvitationLink>, ApiError> {
    auth.require(Page::InvitationLinks)?;
    let conn = ctx.core.open_db()?;
    let link = match Uuid::parse_str(&key) {
        Ok(id) => db::get_invitation_link(&conn, &id)?,
        Err(_) => db::get_invitation_link_by_token(&conn, &key)?,
    };
    link.filter(|l| visible_to(&auth, l))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("invitation link not found".into()))
}

/// `POST /api/invitation-links/:key/deactivate`. Deactivated links read as
/// invalid on the public page.
pub async fn deactivate(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<InvitationLink>, ApiError> {
    auth.require(Page::InvitationLinks)?;
    let id = super::parse_id(&key)?;
    let conn = ctx.core.open_db()?;
    let link = db::get_invitation_link(&conn, &id)?
        .filter(|l| visible_to(&auth, l))
        .ok_or_else(|| ApiError::NotFound(format!("invitation link {id} not found")))?;

    let link = db::deactivate_invitation_link(&conn, &link.id)?;
    tracing::info!(link_id = %link.id, by = %auth.id(), "Invitation link deactivated");
    Ok(Json(link))
}
