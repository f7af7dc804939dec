use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{self, DatabaseError};
use crate::models::{InvitationStatus, ProjectStatus};

/// Dashboard numbers. Every status key is present, zero when unused.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub projects_by_status: BTreeMap<&'static str, i64>,
    pub invitation_funnel: BTreeMap<&'static str, i64>,
    pub total_experts: i64,
    pub completed_calls: i64,
    pub total_cu_consumed: f64,
}

pub fn analytics_summary(conn: &Connection) -> Result<AnalyticsSummary, DatabaseError> {
    let mut projects_by_status: BTreeMap<_, _> =
        ProjectStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for (status, n) in db::count_projects_by_status(conn)? {
        projects_by_status.insert(status.as_str(), n);
    }

    let mut invitation_funnel: BTreeMap<_, _> =
        InvitationStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for (status, n) in db::count_by_invitation_status(conn)? {
        invitation_funnel.insert(status.as_str(), n);
    }

    let (completed_calls, total_cu_consumed) = db::completed_call_totals(conn)?;
    Ok(AnalyticsSummary {
        projects_by_status,
        invitation_funnel,
        total_experts: db::count_experts(conn)?,
        completed_calls,
        total_cu_consumed,
    })
}
