//! RA incentive reports. An RA only ever sees their own figures.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::authorization::Page;
use crate::models::{IncentiveWindow, UserRole, ValidationError};
use crate::workflow::{self, RaIncentiveDetail, RaIncentiveSummary};

fn check_window(window: &IncentiveWindow) -> Result<(), ApiError> {
    match (window.from_date, window.to_date) {
        (Some(from), Some(to)) if to < from => Err(ValidationError::new(
            "toDate",
            "must not be before fromDate",
        )
        .into()),
        _ => Ok(()),
    }
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Query(window): Query<IncentiveWindow>,
) -> Result<Json<Vec<RaIncentiveSummary>>, ApiError> {
    auth.require(Page::RaIncentives)?;
    check_window(&window)?;
    let conn = ctx.core.open_db()?;
    let policy = ctx.core.config.incentives;

    let summaries = if auth.role() == UserRole::Ra {
        vec![workflow::ra_incentive_detail(&conn, &auth.id(), &policy, &window)?.summary]
    } else {
        workflow::ra_incentive_summaries(&conn, &policy, &window)?
    };
    Ok(Json(summaries))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthUser>,
    Path(ra_id): Path<String>,
    Query(window): Query<IncentiveWindow>,
) -> Result<Json<RaIncentiveDetail>, ApiError> {
    auth.require(Page::RaIncentives)?;
    check_window(&window)?;
    let ra_id = parse_id(&ra_id)?;
    if auth.role() == UserRole::Ra && ra_id != auth.id() {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.core.open_db()?;
    let policy = ctx.core.config.incentives;
    Ok(Json(workflow::ra_incentive_detail(&conn, &ra_id, &policy, &window)?))
}
