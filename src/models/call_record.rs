use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::CallStatus;
use super::validation::*;

/// Longest call we accept on a single record (12 hours).
pub const MAX_CALL_MINUTES: i64 = 720;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub project_expert_id: Option<Uuid>,
    pub call_date: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub cu_used: f64,
    pub status: CallStatus,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    /// Date used for incentive windows: the call date, else completion time.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.call_date.or(self.completed_at)
    }
}

fn check_duration(value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(m) if !(0..=MAX_CALL_MINUTES).contains(&m) => Err(ValidationError::new(
            "durationMinutes",
            format!("must be between 0 and {MAX_CALL_MINUTES}"),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCallRecord {
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub project_expert_id: Option<Uuid>,
    pub call_date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub status: Option<CallStatus>,
    pub notes: Option<String>,
}

impl Validate for NewCallRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        check_duration(self.duration_minutes)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecordUpdate {
    pub status: Option<CallStatus>,
    pub duration_minutes: Option<i64>,
    pub call_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Validate for CallRecordUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        check_duration(self.duration_minutes)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}

/// Body of `POST /project-experts/:id/schedule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCall {
    pub call_date: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

impl Validate for ScheduleCall {
    fn validate(&self) -> Result<(), ValidationError> {
        check_duration(self.duration_minutes)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}
