//! Employee management (`/api/users`), admin only.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use super::{parse_id, Ack};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::crypto::hash_password;
use crate::db;
use crate::models::{NewUser, User, UserRole, UserUpdate, Validate};

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require(Page::Employees)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_users(&conn, query.role)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<NewUser>,
) -> Result<Json<User>, ApiError> {
    auth.require(Page::Employees)?;
    body.validate()?;
    let conn = ctx.core.open_db()?;
    let user = db::insert_user(&conn, &body, &hash_password(&body.password))?;
    tracing::info!(user_id = %user.id, role = %user.role, by = %auth.id(), "Employee created");
    Ok(Json(user))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    auth.require(Page::Employees)?;
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    db::get_user(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

/// Deactivating an account also ends its sessions.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    auth.require(Page::Employees)?;
    body.validate()?;
    let id = parse_id(&id)?;
    if id == auth.id() && (body.is_active == Some(false) || body.role.is_some_and(|r| r != UserRole::Admin)) {
        return Err(ApiError::BadRequest("You cannot demote or deactivate yourself".into()));
    }

    let conn = ctx.core.open_db()?;
    let tx = conn.unchecked_transaction()?;
    let user = db::update_user(&tx, &id, &body)?;
    if !user.is_active {
        db::delete_user_sessions(&tx, &id)?;
    }
    tx.commit()?;
    Ok(Json(user))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    auth.require(Page::Employees)?;
    let id = parse_id(&id)?;
    if id == auth.id() {
        return Err(ApiError::BadRequest("You cannot delete your own account".into()));
    }
    let conn = ctx.core.open_db()?;
    db::delete_user(&conn, &id)?;
    tracing::info!(user_id = %id, by = %auth.id(), "Employee deleted");
    Ok(Ack::done())
}
