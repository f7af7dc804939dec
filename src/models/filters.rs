use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::enums::{CallStatus, InviteType, PipelineStatus, ProjectExpertStatus, ProjectStatus};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub client_organization_id: Option<Uuid>,
    pub pm_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertFilter {
    pub search: Option<String>,
    pub sourced_by_ra_id: Option<Uuid>,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExpertFilter {
    pub project_id: Option<Uuid>,
    pub expert_id: Option<Uuid>,
    pub status: Option<ProjectExpertStatus>,
    pub pipeline_status: Option<PipelineStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecordFilter {
    pub project_id: Option<Uuid>,
    pub expert_id: Option<Uuid>,
    pub status: Option<CallStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageFilter {
    pub project_id: Option<Uuid>,
    pub expert_id: Option<Uuid>,
    pub client_organization_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationLinkFilter {
    pub project_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub invite_type: Option<InviteType>,
    pub active_only: Option<bool>,
}

/// Reporting window for RA incentives; both ends inclusive, open when absent.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveWindow {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl IncentiveWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from_date.map_or(true, |from| day >= from) && self.to_date.map_or(true, |to| day <= to)
    }
}
