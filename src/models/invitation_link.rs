use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Decision, InviteType};
use super::expert::NewExpert;
use super::project_expert::{validate_answers, InviteResponse, VqAnswer};
use super::validation::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationLink {
    pub id: Uuid,
    pub token: String,
    pub invite_type: InviteType,
    pub project_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub expert_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InvitationLink {
    /// Checks the link is consumable at `now`. Order matters: a used link
    /// reports `Used` even if it has since expired.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), LinkRejection> {
        if !self.is_active {
            return Err(LinkRejection::Invalid);
        }
        if self.used_at.is_some() {
            return Err(LinkRejection::Used);
        }
        if matches!(self.expires_at, Some(exp) if exp <= now) {
            return Err(LinkRejection::Expired);
        }
        Ok(())
    }
}

/// Why a token cannot be consumed. Each maps to distinct client copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkRejection {
    Invalid,
    Expired,
    Used,
}

impl LinkRejection {
    /// Copy key rendered by the client.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Invalid => "invalidLink",
            Self::Expired => "expiredLink",
            Self::Used => "usedLink",
        }
    }
}

impl std::fmt::Display for LinkRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitationLink {
    pub invite_type: InviteType,
    pub project_id: Option<Uuid>,
    pub ra_id: Option<Uuid>,
    pub expert_id: Option<Uuid>,
    /// Falls back to the configured default when absent; `0` means no expiry.
    pub expires_in_days: Option<i64>,
}

impl Validate for NewInvitationLink {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.invite_type == InviteType::Existing && self.expert_id.is_none() {
            return Err(ValidationError::new(
                "expertId",
                "is required for existing-expert invitations",
            ));
        }
        if self.invite_type == InviteType::Existing && self.project_id.is_none() {
            return Err(ValidationError::new(
                "projectId",
                "is required for existing-expert invitations",
            ));
        }
        if self.invite_type != InviteType::Existing && self.expert_id.is_some() {
            return Err(ValidationError::new(
                "expertId",
                "only applies to existing-expert invitations",
            ));
        }
        if matches!(self.expires_in_days, Some(d) if !(0..=365).contains(&d)) {
            return Err(ValidationError::new("expiresInDays", "must be between 0 and 365"));
        }
        Ok(())
    }
}

/// Body of `POST /expert-invite/:token/accept`.
///
/// General and RA links carry the new expert's profile; existing-expert
/// links only carry the answers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitation {
    pub expert: Option<NewExpert>,
    #[serde(default)]
    pub vq_answers: Vec<VqAnswer>,
    pub availability_note: Option<String>,
}

impl AcceptInvitation {
    pub fn response(&self) -> InviteResponse {
        InviteResponse {
            vq_answers: self.vq_answers.clone(),
            availability_note: self.availability_note.clone(),
        }
    }
}

impl Validate for AcceptInvitation {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(expert) = &self.expert {
            expert.validate()?;
        }
        validate_answers(&self.vq_answers)?;
        optional_text("availabilityNote", self.availability_note.as_deref(), 2000)
    }
}

/// Body of `POST /quick-invite/:token/decide`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickDecision {
    pub decision: Decision,
    #[serde(default)]
    pub vq_answers: Vec<VqAnswer>,
    pub availability_note: Option<String>,
}

impl QuickDecision {
    pub fn response(&self) -> InviteResponse {
        InviteResponse {
            vq_answers: self.vq_answers.clone(),
            availability_note: self.availability_note.clone(),
        }
    }
}

impl Validate for QuickDecision {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_answers(&self.vq_answers)?;
        optional_text("availabilityNote", self.availability_note.as_deref(), 2000)
    }
}
