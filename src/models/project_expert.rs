use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{InvitationStatus, PipelineStatus, ProjectExpertStatus};
use super::validation::*;

/// Assignment of an expert to a project, carrying the three status tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExpert {
    pub id: Uuid,
    pub project_id: Uuid,
    pub expert_id: Uuid,
    pub status: ProjectExpertStatus,
    pub invitation_status: InvitationStatus,
    pub pipeline_status: Option<PipelineStatus>,
    pub invitation_token: String,
    pub assigned_at: DateTime<Utc>,
    pub invited_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub selected_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub vq_answers: Vec<VqAnswer>,
    pub availability_note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VqAnswer {
    pub question_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
}

pub fn validate_answers(answers: &[VqAnswer]) -> Result<(), ValidationError> {
    if answers.len() > 50 {
        return Err(ValidationError::new("vqAnswers", "at most 50 answers"));
    }
    for a in answers {
        require_text("vqAnswers.question", &a.question, 1000)?;
        optional_text("vqAnswers.answer", Some(&a.answer), 8000)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectExpert {
    pub project_id: Uuid,
    pub expert_id: Uuid,
}

impl Validate for NewProjectExpert {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExpertUpdate {
    pub status: Option<ProjectExpertStatus>,
    pub pipeline_status: Option<PipelineStatus>,
    pub availability_note: Option<String>,
}

impl Validate for ProjectExpertUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        optional_text("availabilityNote", self.availability_note.as_deref(), 2000)
    }
}

/// Response payload for an invitation (link or quick invite).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    #[serde(default)]
    pub vq_answers: Vec<VqAnswer>,
    pub availability_note: Option<String>,
}

impl Validate for InviteResponse {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_answers(&self.vq_answers)?;
        optional_text("availabilityNote", self.availability_note.as_deref(), 2000)
    }
}
