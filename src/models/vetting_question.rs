use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VettingQuestion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub question: String,
    pub position: i64,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVettingQuestion {
    pub project_id: Uuid,
    pub question: String,
    /// Appended after the last question when absent.
    pub position: Option<i64>,
    pub is_required: Option<bool>,
}

impl Validate for NewVettingQuestion {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("question", &self.question, 1000)?;
        if matches!(self.position, Some(p) if p < 0) {
            return Err(ValidationError::new("position", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VettingQuestionUpdate {
    pub question: Option<String>,
    pub position: Option<i64>,
    pub is_required: Option<bool>,
}

impl Validate for VettingQuestionUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(q) = &self.question {
            require_text("question", q, 1000)?;
        }
        if matches!(self.position, Some(p) if p < 0) {
            return Err(ValidationError::new("position", "must not be negative"));
        }
        Ok(())
    }
}
