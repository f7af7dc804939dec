//! Staff sign-in and session endpoints.
//!
//! `POST /api/auth/login` is public; every other route here runs behind the
//! auth middleware.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Ack;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Permissions;
use crate::crypto::{generate_token, hash_password, hash_token, verify_password};
use crate::db::{self, now};
use crate::models::{PasswordChange, User, Validate};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    pub permissions: Permissions,
}

fn open_session(
    conn: &rusqlite::Connection,
    user: User,
    ttl_hours: i64,
) -> Result<SessionResponse, ApiError> {
    let token = generate_token();
    let created_at = now();
    let expires_at = created_at + Duration::hours(ttl_hours);
    db::insert_session(conn, &hash_token(&token), &user.id, created_at, expires_at)?;
    Ok(SessionResponse {
        token,
        expires_at,
        permissions: Permissions::for_role(user.role),
        user,
    })
}

/// `POST /api/auth/login`
///
/// Unknown email, wrong password and deactivated account all answer the same
/// 401 so the response does not reveal which accounts exist.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::purge_expired_sessions(&conn, now())?;

    let Some((user, stored)) = db::get_user_credentials(&conn, &body.email)? else {
        tracing::info!("Login rejected: unknown email");
        return Err(ApiError::Unauthorized);
    };
    if !user.is_active || !verify_password(&body.password, &stored)? {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(ApiError::Unauthorized);
    }

    let session = open_session(&conn, user, ctx.core.config.auth.session_ttl_hours)?;
    tracing::info!(user_id = %session.user.id, role = %session.user.role, "Signed in");
    Ok(Json(session))
}

/// `GET /api/auth/me`
pub async fn me(Extension(auth): Extension<AuthUser>) -> Json<User> {
    Json(auth.user)
}

/// `GET /api/auth/permissions`
pub async fn permissions(Extension(auth): Extension<AuthUser>) -> Json<Permissions> {
    Json(Permissions::for_role(auth.role()))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Ack>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_session(&conn, &auth.token_hash)?;
    tracing::info!(user_id = %auth.id(), "Signed out");
    Ok(Ack::done())
}

/// `POST /api/auth/change-password`
///
/// Revokes every session of the user and returns a fresh one.
pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<PasswordChange>,
) -> Result<Json<SessionResponse>, ApiError> {
    body.validate()?;
    let conn = ctx.core.open_db()?;

    let stored = db::get_password_hash(&conn, &auth.id())?;
    if !verify_password(&body.current_password, &stored)? {
        return Err(ApiError::BadRequest("Current password is incorrect".into()));
    }

    let tx = conn.unchecked_transaction()?;
    db::set_password(&tx, &auth.id(), &hash_password(&body.new_password))?;
    db::delete_user_sessions(&tx, &auth.id())?;
    let session = open_session(&tx, auth.user, ctx.core.config.auth.session_ttl_hours)?;
    tx.commit()?;

    tracing::info!(user_id = %session.user.id, "Password changed");
    Ok(Json(session))
}
