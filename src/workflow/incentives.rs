//! RA incentive aggregation.
//!
//! An RA earns a flat amount per completed call of an expert they sourced,
//! as long as the call happens within the eligibility window that opens at
//! `sourced_at`. The aggregation itself is pure; the loaders below only
//! fetch rows for it.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncentivePolicy {
    pub incentive_per_call_brl: f64,
    pub eligibility_window_days: i64,
}

impl Default for IncentivePolicy {
    fn default() -> Self {
        Self {
            incentive_per_call_brl: 100.0,
            eligibility_window_days: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaIncentiveSummary {
    pub ra_id: Uuid,
    pub ra_name: String,
    pub ra_email: String,
    pub total_recruited_experts: usize,
    pub experts_with_completed_calls: usize,
    pub total_eligible_calls: usize,
    #[serde(rename = "totalIncentiveBRL")]
    pub total_incentive_brl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertIncentiveLine {
    pub expert_id: Uuid,
    pub expert_name: String,
    pub sourced_at: Option<DateTime<Utc>>,
    pub eligible_until: Option<DateTime<Utc>>,
    pub eligible_calls: usize,
    #[serde(rename = "incentiveBRL")]
    pub incentive_brl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaIncentiveDetail {
    #[serde(flatten)]
    pub summary: RaIncentiveSummary,
    pub experts: Vec<ExpertIncentiveLine>,
}

fn eligible_until(expert: &Expert, policy: &IncentivePolicy) -> Option<DateTime<Utc>> {
    expert
        .sourced_at
        .map(|at| at + Duration::days(policy.eligibility_window_days))
}

/// Whether `call` earns an incentive for the RA who sourced `expert`.
pub fn is_eligible(
    call: &CallRecord,
    expert: &Expert,
    policy: &IncentivePolicy,
    window: &IncentiveWindow,
) -> bool {
    if call.status != CallStatus::Completed || call.expert_id != expert.id {
        return false;
    }
    let (Some(sourced_at), Some(until), Some(when)) = (
        expert.sourced_at,
        eligible_until(expert, policy),
        call.effective_date(),
    ) else {
        return false;
    };
    when >= sourced_at && when <= until && window.contains(when.date_naive())
}

/// Aggregate one RA's incentives from their sourced experts and those
/// experts' calls. Calls of other experts are ignored.
pub fn summarize(
    ra: &User,
    experts: &[Expert],
    calls: &[CallRecord],
    policy: &IncentivePolicy,
    window: &IncentiveWindow,
) -> RaIncentiveDetail {
    let lines: Vec<ExpertIncentiveLine> = experts
        .iter()
        .filter(|e| e.sourced_by_ra_id == Some(ra.id))
        .map(|expert| {
            let eligible_calls = calls
                .iter()
                .filter(|c| is_eligible(c, expert, policy, window))
                .count();
            ExpertIncentiveLine {
                expert_id: expert.id,
                expert_name: expert.name.clone(),
                sourced_at: expert.sourced_at,
                eligible_until: eligible_until(expert, policy),
                eligible_calls,
                incentive_brl: eligible_calls as f64 * policy.incentive_per_call_brl,
            }
        })
        .collect();

    let total_eligible_calls: usize = lines.iter().map(|l| l.eligible_calls).sum();
    RaIncentiveDetail {
        summary: RaIncentiveSummary {
            ra_id: ra.id,
            ra_name: ra.name.clone(),
            ra_email: ra.email.clone(),
            total_recruited_experts: lines.len(),
            experts_with_completed_calls: lines.iter().filter(|l| l.eligible_calls > 0).count(),
            total_eligible_calls,
            total_incentive_brl: total_eligible_calls as f64 * policy.incentive_per_call_brl,
        },
        experts: lines,
    }
}

fn load_detail(
    conn: &Connection,
    ra: &User,
    policy: &IncentivePolicy,
    window: &IncentiveWindow,
) -> Result<RaIncentiveDetail, DatabaseError> {
    let experts = db::list_experts_sourced_by(conn, &ra.id)?;
    let calls = db::list_completed_calls_for_ra(conn, &ra.id)?;
    Ok(summarize(ra, &experts, &calls, policy, window))
}

/// One summary per RA account, active or not.
pub fn ra_incentive_summaries(
    conn: &Connection,
    policy: &IncentivePolicy,
    window: &IncentiveWindow,
) -> Result<Vec<RaIncentiveSummary>, DatabaseError> {
    let mut summaries = Vec::new();
    for ra in db::list_users(conn, Some(UserRole::Ra))? {
        summaries.push(load_detail(conn, &ra, policy, window)?.summary);
    }
    Ok(summaries)
}

pub fn ra_incentive_detail(
    conn: &Connection,
    ra_id: &Uuid,
    policy: &IncentivePolicy,
    window: &IncentiveWindow,
) -> Result<RaIncentiveDetail, DatabaseError> {
    let ra = db::get_user(conn, ra_id)?
        .filter(|u| u.role == UserRole::Ra)
        .ok_or_else(|| DatabaseError::not_found("ra", ra_id))?;
    load_detail(conn, &ra, policy, window)
}
