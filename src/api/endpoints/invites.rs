//! Public invitation pages. No login; rate limited per token by the router.
//!
//! Shareable links live under `/api/expert-invite/:token`, per-assignment
//! quick invites under `/api/quick-invite/:token`. Unknown, expired and
//! spent tokens answer with distinct reasons the page renders as copy.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::*;
use crate::workflow::{self, DecisionView, InvitationOutcome, LinkView, QuickInviteView};

/// `GET /api/expert-invite/:token`
pub async fn open_link(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<LinkView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::open_link(&conn, &token)?))
}

/// `POST /api/expert-invite/:token/accept`
pub async fn accept_link(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
    Json(body): Json<AcceptInvitation>,
) -> Result<Json<InvitationOutcome>, ApiError> {
    body.validate()?;
    let mut conn = ctx.core.open_db()?;

    // General and RA links create the expert from the submitted profile.
    if let Some(link) = db::get_invitation_link_by_token(&conn, &token)? {
        if link.invite_type != InviteType::Existing && body.expert.is_none() {
            return Err(ValidationError::new("expert", "a profile is required").into());
        }
    }

    Ok(Json(workflow::accept_link(&mut conn, &token, &body)?))
}

/// `POST /api/expert-invite/:token/decline`
pub async fn decline_link(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
    body: Option<Json<InviteResponse>>,
) -> Result<Json<InvitationOutcome>, ApiError> {
    let response = body.map(|Json(b)| b).unwrap_or_default();
    response.validate()?;
    let mut conn = ctx.core.open_db()?;
    Ok(Json(workflow::decline_link(&mut conn, &token, &response)?))
}

/// `GET /api/quick-invite/:token`
pub async fn open_quick(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<QuickInviteView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::open_quick_invite(&conn, &token)?))
}

/// `GET /api/quick-invite/:token/decision`
pub async fn quick_decision(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<DecisionView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(workflow::quick_invite_decision(&conn, &token)?))
}

/// `POST /api/quick-invite/:token/decide`
pub async fn decide_quick(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
    Json(body): Json<QuickDecision>,
) -> Result<Json<ProjectExpert>, ApiError> {
    body.validate()?;
    let mut conn = ctx.core.open_db()?;
    Ok(Json(workflow::decide_quick_invite(&mut conn, &token, &body)?))
}
