use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::call_record::MAX_CALL_MINUTES;
use super::validation::*;

/// Legacy usage entry. Kept alongside call records; not linked to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub call_date: NaiveDate,
    pub duration_minutes: i64,
    pub credits_used: f64,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUsageRecord {
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub call_date: NaiveDate,
    pub duration_minutes: i64,
    /// Derived from the duration when absent.
    pub credits_used: Option<f64>,
    pub notes: Option<String>,
}

impl Validate for NewUsageRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0..=MAX_CALL_MINUTES).contains(&self.duration_minutes) {
            return Err(ValidationError::new(
                "durationMinutes",
                format!("must be between 0 and {MAX_CALL_MINUTES}"),
            ));
        }
        non_negative("creditsUsed", self.credits_used)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}

/// Usage row joined with display names, as listed and exported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReportRow {
    pub id: Uuid,
    pub call_date: NaiveDate,
    pub project_id: Uuid,
    pub project_name: String,
    pub client_name: Option<String>,
    pub expert_id: Uuid,
    pub expert_name: String,
    pub duration_minutes: i64,
    pub credits_used: f64,
    pub notes: Option<String>,
}
