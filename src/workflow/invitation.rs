//! Public invitation flows: shareable links and per-assignment quick invites.
//!
//! Every consuming call runs in an IMMEDIATE transaction and writes through
//! a conditional update, so of two concurrent redemptions exactly one wins
//! and the other sees `LinkRejection::Used`.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use super::transitions::{ensure_pipeline_transition, ensure_transition, StatusGraph};
use crate::crypto::generate_token;
use crate::db::{self, now, DatabaseError};
use crate::models::*;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationProject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Project> for InvitationProject {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
        }
    }
}

/// What an expert sees when opening a shareable link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub invite_type: InviteType,
    pub expires_at: Option<DateTime<Utc>>,
    pub project: Option<InvitationProject>,
    pub expert_name: Option<String>,
    pub vetting_questions: Vec<VettingQuestion>,
}

/// What an expert sees when opening a quick-invite link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickInviteView {
    pub project: InvitationProject,
    pub expert_name: String,
    pub invitation_status: InvitationStatus,
    pub vetting_questions: Vec<VettingQuestion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionView {
    pub decision: Option<Decision>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationOutcome {
    pub decision: Decision,
    pub expert_id: Option<Uuid>,
    pub project_expert: Option<ProjectExpert>,
}

fn rejected(reason: LinkRejection) -> DatabaseError {
    DatabaseError::LinkRejected(reason)
}

/// Look up a link and check it can still be consumed.
pub fn resolve_link(
    conn: &Connection,
    token: &str,
    at: DateTime<Utc>,
) -> Result<InvitationLink, DatabaseError> {
    let link = db::get_invitation_link_by_token(conn, token)?
        .ok_or_else(|| rejected(LinkRejection::Invalid))?;
    link.check_usable(at).map_err(rejected)?;
    Ok(link)
}

fn resolve_quick(conn: &Connection, token: &str) -> Result<ProjectExpert, DatabaseError> {
    db::get_project_expert_by_token(conn, token)?.ok_or_else(|| rejected(LinkRejection::Invalid))
}

fn log(
    conn: &Connection,
    pe: &ProjectExpert,
    kind: ActivityType,
    description: &str,
) -> Result<(), DatabaseError> {
    db::insert_activity(
        conn,
        &ProjectActivity::new(pe.project_id, Some(pe.expert_id), None, kind, description),
    )
}

/// Record that the expert opened their invitation. Returns whether
/// anything changed.
fn mark_opened(conn: &Connection, pe: &mut ProjectExpert, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    if pe.responded_at.is_some() {
        return Ok(false);
    }
    let first_open = pe.opened_at.is_none();
    let advance = pe.invitation_status != InvitationStatus::Opened
        && pe.invitation_status.can_become(InvitationStatus::Opened);
    if !first_open && !advance {
        return Ok(false);
    }

    pe.opened_at.get_or_insert(at);
    if advance {
        pe.invitation_status = InvitationStatus::Opened;
    }
    pe.updated_at = at;
    db::save_project_expert(conn, pe)?;
    if first_open {
        log(conn, pe, ActivityType::InvitationOpened, "Invitation opened")?;
    }
    Ok(true)
}

/// Write the expert's answer onto an assignment, once.
fn apply_response(
    conn: &Connection,
    pe: &mut ProjectExpert,
    decision: Decision,
    response: &InviteResponse,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    if pe.responded_at.is_some() {
        return Err(rejected(LinkRejection::Used));
    }
    let (status, invitation, pipeline) = match decision {
        Decision::Accept => (
            ProjectExpertStatus::Accepted,
            InvitationStatus::Accepted,
            PipelineStatus::Interested,
        ),
        Decision::Decline => (
            ProjectExpertStatus::Declined,
            InvitationStatus::Declined,
            PipelineStatus::Declined,
        ),
    };
    ensure_transition(pe.status, status)?;
    ensure_transition(pe.invitation_status, invitation)?;
    ensure_pipeline_transition(pe.pipeline_status, pipeline)?;

    pe.status = status;
    pe.invitation_status = invitation;
    pe.pipeline_status = Some(pipeline);
    pe.opened_at.get_or_insert(at);
    pe.responded_at = Some(at);
    if !response.vq_answers.is_empty() {
        pe.vq_answers = response.vq_answers.clone();
    }
    if let Some(note) = &response.availability_note {
        pe.availability_note = Some(note.trim().to_string());
    }
    pe.updated_at = at;

    if !db::save_project_expert_response(conn, pe)? {
        return Err(rejected(LinkRejection::Used));
    }
    let (kind, text) = match decision {
        Decision::Accept => (ActivityType::ExpertAccepted, "Invitation accepted"),
        Decision::Decline => (ActivityType::ExpertDeclined, "Invitation declined"),
    };
    log(conn, pe, kind, text)
}

// ═══════════════════════════════════════════════════════════
// Shareable links
// ═══════════════════════════════════════════════════════════

/// Issue a shareable link. `expires_in_days` of 0 disables expiry; absent
/// falls back to `default_ttl_days`. RA links default to the creator as RA.
pub fn create_link(
    conn: &Connection,
    new: &NewInvitationLink,
    created_by: Option<Uuid>,
    default_ttl_days: i64,
) -> Result<InvitationLink, DatabaseError> {
    if let Some(project_id) = &new.project_id {
        db::require_project(conn, project_id)?;
    }
    if let Some(expert_id) = &new.expert_id {
        db::require_expert(conn, expert_id)?;
    }
    let ra_id = match new.invite_type {
        InviteType::Ra => {
            let ra_id = new.ra_id.or(created_by).ok_or_else(|| {
                DatabaseError::ConstraintViolation("RA links need an RA".into())
            })?;
            let ra = db::get_user(conn, &ra_id)?.ok_or_else(|| DatabaseError::not_found("user", ra_id))?;
            if ra.role != UserRole::Ra {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "user {ra_id} is not an RA"
                )));
            }
            Some(ra_id)
        }
        _ => new.ra_id,
    };

    let created_at = now();
    let ttl = new.expires_in_days.unwrap_or(default_ttl_days);
    let link = InvitationLink {
        id: Uuid::new_v4(),
        token: generate_token(),
        invite_type: new.invite_type,
        project_id: new.project_id,
        ra_id,
        expert_id: new.expert_id,
        created_by,
        is_active: true,
        expires_at: (ttl > 0).then(|| created_at + Duration::days(ttl)),
        used_at: None,
        created_at,
    };
    db::insert_invitation_link(conn, &link)?;

    tracing::info!(link_id = %link.id, invite_type = %link.invite_type, "Invitation link created");
    Ok(link)
}

pub fn open_link(conn: &Connection, token: &str) -> Result<LinkView, DatabaseError> {
    let now = now();
    let link = resolve_link(conn, token, now)?;

    let project = link
        .project_id
        .map(|id| db::require_project(conn, &id))
        .transpose()?;
    let expert = link
        .expert_id
        .map(|id| db::require_expert(conn, &id))
        .transpose()?;
    let vetting_questions = match &project {
        Some(p) => db::list_vetting_questions(conn, Some(&p.id))?,
        None => Vec::new(),
    };

    if let (Some(p), Some(e)) = (&project, &expert) {
        if let Some(mut pe) = db::find_project_expert(conn, &p.id, &e.id)? {
            mark_opened(conn, &mut pe, now)?;
        }
    }

    Ok(LinkView {
        invite_type: link.invite_type,
        expires_at: link.expires_at,
        project: project.map(InvitationProject::from),
        expert_name: expert.map(|e| e.name),
        vetting_questions,
    })
}

/// Accept a shareable link.
///
/// `existing` links attach their expert to the project; `general` and `ra`
/// links create the expert from the submitted profile, crediting the RA
/// for `ra` links.
pub fn accept_link(
    conn: &mut Connection,
    token: &str,
    body: &AcceptInvitation,
) -> Result<InvitationOutcome, DatabaseError> {
    let now = now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let link = resolve_link(&tx, token, now)?;
    if !db::mark_invitation_link_used(&tx, &link.id, now)? {
        return Err(rejected(LinkRejection::Used));
    }

    let expert_id = match link.invite_type {
        InviteType::Existing => link.expert_id.ok_or_else(|| {
            DatabaseError::ConstraintViolation("existing-expert link has no expert".into())
        })?,
        InviteType::General | InviteType::Ra => {
            let mut profile = body.expert.clone().ok_or_else(|| {
                DatabaseError::ConstraintViolation("expert profile is required".into())
            })?;
            profile.sourced_by_ra_id = match link.invite_type {
                InviteType::Ra => link.ra_id,
                _ => None,
            };
            db::insert_expert(&tx, &profile)?.id
        }
    };

    let project_expert = match link.project_id {
        Some(project_id) => {
            let mut pe = match db::find_project_expert(&tx, &project_id, &expert_id)? {
                Some(pe) => pe,
                None => {
                    let pe = db::insert_project_expert(
                        &tx,
                        &NewProjectExpert {
                            project_id,
                            expert_id,
                        },
                    )?;
                    log(&tx, &pe, ActivityType::ExpertAssigned, "Joined through invitation link")?;
                    pe
                }
            };
            apply_response(&tx, &mut pe, Decision::Accept, &body.response(), now)?;
            Some(pe)
        }
        None => None,
    };
    tx.commit()?;

    tracing::info!(link_id = %link.id, expert_id = %expert_id, "Invitation link accepted");
    Ok(InvitationOutcome {
        decision: Decision::Accept,
        expert_id: Some(expert_id),
        project_expert,
    })
}

/// Decline a shareable link. Nothing is deleted; the link is spent and an
/// existing assignment, if any, records the decline.
pub fn decline_link(
    conn: &mut Connection,
    token: &str,
    response: &InviteResponse,
) -> Result<InvitationOutcome, DatabaseError> {
    let now = now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let link = resolve_link(&tx, token, now)?;
    if !db::mark_invitation_link_used(&tx, &link.id, now)? {
        return Err(rejected(LinkRejection::Used));
    }

    let project_expert = match (link.project_id, link.expert_id) {
        (Some(project_id), Some(expert_id)) => {
            match db::find_project_expert(&tx, &project_id, &expert_id)? {
                Some(mut pe) => {
                    apply_response(&tx, &mut pe, Decision::Decline, response, now)?;
                    Some(pe)
                }
                None => None,
            }
        }
        _ => None,
    };
    tx.commit()?;

    tracing::info!(link_id = %link.id, "Invitation link declined");
    Ok(InvitationOutcome {
        decision: Decision::Decline,
        expert_id: link.expert_id,
        project_expert,
    })
}

// ═══════════════════════════════════════════════════════════
// Quick invites (per-assignment token)
// ═══════════════════════════════════════════════════════════

pub fn open_quick_invite(conn: &Connection, token: &str) -> Result<QuickInviteView, DatabaseError> {
    let mut pe = resolve_quick(conn, token)?;
    if pe.responded_at.is_some() {
        return Err(rejected(LinkRejection::Used));
    }
    mark_opened(conn, &mut pe, now())?;

    let project = db::require_project(conn, &pe.project_id)?;
    let expert = db::require_expert(conn, &pe.expert_id)?;
    let vetting_questions = db::list_vetting_questions(conn, Some(&pe.project_id))?;
    Ok(QuickInviteView {
        project: project.into(),
        expert_name: expert.name,
        invitation_status: pe.invitation_status,
        vetting_questions,
    })
}

/// Current answer on a quick invite, for the confirmation page.
pub fn quick_invite_decision(conn: &Connection, token: &str) -> Result<DecisionView, DatabaseError> {
    let pe = resolve_quick(conn, token)?;
    let decision = match pe.invitation_status {
        InvitationStatus::Accepted => Some(Decision::Accept),
        InvitationStatus::Declined => Some(Decision::Decline),
        _ => None,
    };
    Ok(DecisionView {
        decision,
        responded_at: pe.responded_at,
    })
}

pub fn decide_quick_invite(
    conn: &mut Connection,
    token: &str,
    body: &QuickDecision,
) -> Result<ProjectExpert, DatabaseError> {
    let now = now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut pe = resolve_quick(&tx, token)?;
    apply_response(&tx, &mut pe, body.decision, &body.response(), now)?;
    tx.commit()?;

    tracing::info!(project_expert_id = %pe.id, decision = ?body.decision, "Quick invite answered");
    Ok(pe)
}
