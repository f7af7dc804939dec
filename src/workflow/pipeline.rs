//! Staff-driven moves through the assignment pipeline: assign, invite,
//! shortlist, client selection, scheduling and call outcomes.

use rusqlite::Connection;
use uuid::Uuid;

use super::credits::calculate_cu;
use super::transitions::{ensure_pipeline_transition, ensure_transition, StatusGraph};
use crate::db::{self, now, DatabaseError};
use crate::models::*;

fn log(
    conn: &Connection,
    pe: &ProjectExpert,
    actor: Option<Uuid>,
    kind: ActivityType,
    description: impl Into<String>,
) -> Result<(), DatabaseError> {
    db::insert_activity(
        conn,
        &ProjectActivity::new(pe.project_id, Some(pe.expert_id), actor, kind, description),
    )
}

/// Attach an expert to a project.
pub fn assign_expert(
    conn: &Connection,
    new: &NewProjectExpert,
    actor: Option<Uuid>,
) -> Result<ProjectExpert, DatabaseError> {
    db::require_project(conn, &new.project_id)?;
    let expert = db::require_expert(conn, &new.expert_id)?;

    let tx = conn.unchecked_transaction()?;
    let pe = db::insert_project_expert(&tx, new)?;
    log(&tx, &pe, actor, ActivityType::ExpertAssigned, format!("{} assigned", expert.name))?;
    tx.commit()?;

    tracing::info!(project_expert_id = %pe.id, project_id = %pe.project_id, "Expert assigned");
    Ok(pe)
}

/// Mark an assignment as invited. The quick-invite token exists from
/// assignment onward; inviting only records that it was sent.
pub fn invite_expert(
    conn: &Connection,
    id: &Uuid,
    actor: Option<Uuid>,
) -> Result<ProjectExpert, DatabaseError> {
    let mut pe = db::require_project_expert(conn, id)?;
    ensure_transition(pe.status, ProjectExpertStatus::Invited)?;
    ensure_transition(pe.invitation_status, InvitationStatus::Invited)?;

    let now = now();
    pe.status = ProjectExpertStatus::Invited;
    pe.invitation_status = InvitationStatus::Invited;
    pe.invited_at.get_or_insert(now);
    pe.updated_at = now;

    let tx = conn.unchecked_transaction()?;
    db::save_project_expert(&tx, &pe)?;
    log(&tx, &pe, actor, ActivityType::ExpertInvited, "Invitation sent")?;
    tx.commit()?;
    Ok(pe)
}

/// Carry a staff-recorded status onto the invitation and pipeline tracks.
/// Client selection, scheduling and completion only happen through their
/// own operations.
fn apply_staff_status(pe: &mut ProjectExpert, status: ProjectExpertStatus) -> Result<(), DatabaseError> {
    let now = now();
    match status {
        ProjectExpertStatus::Invited => {
            ensure_transition(pe.invitation_status, InvitationStatus::Invited)?;
            pe.invitation_status = InvitationStatus::Invited;
            pe.invited_at.get_or_insert(now);
        }
        ProjectExpertStatus::Accepted => {
            ensure_transition(pe.invitation_status, InvitationStatus::Accepted)?;
            pe.invitation_status = InvitationStatus::Accepted;
            pe.responded_at.get_or_insert(now);
            if pe.pipeline_status.is_none() {
                pe.pipeline_status = Some(PipelineStatus::Interested);
            }
        }
        ProjectExpertStatus::Declined => {
            ensure_transition(pe.invitation_status, InvitationStatus::Declined)?;
            ensure_pipeline_transition(pe.pipeline_status, PipelineStatus::Declined)?;
            pe.invitation_status = InvitationStatus::Declined;
            pe.pipeline_status = Some(PipelineStatus::Declined);
            pe.responded_at.get_or_insert(now);
        }
        other => {
            return Err(DatabaseError::InvalidTransition {
                entity: ProjectExpertStatus::ENTITY,
                from: pe.status.to_string(),
                to: other.to_string(),
            })
        }
    }
    Ok(())
}

/// Apply a PATCH to an assignment, enforcing forward-only moves.
pub fn update_assignment(
    conn: &Connection,
    id: &Uuid,
    update: &ProjectExpertUpdate,
    actor: Option<Uuid>,
) -> Result<ProjectExpert, DatabaseError> {
    let mut pe = db::require_project_expert(conn, id)?;
    let mut events = Vec::new();

    if let Some(status) = update.status {
        ensure_transition(pe.status, status)?;
        if status != pe.status {
            apply_staff_status(&mut pe, status)?;
            events.push((
                ActivityType::StatusChanged,
                format!("Status {} -> {}", pe.status, status),
            ));
            pe.status = status;
        }
    }
    if let Some(pipeline) = update.pipeline_status {
        ensure_pipeline_transition(pe.pipeline_status, pipeline)?;
        if pe.pipeline_status != Some(pipeline) {
            let kind = if pipeline == PipelineStatus::Shortlisted {
                ActivityType::ExpertShortlisted
            } else {
                ActivityType::StatusChanged
            };
            events.push((kind, format!("Pipeline -> {pipeline}")));
            pe.pipeline_status = Some(pipeline);
        }
    }
    if let Some(note) = &update.availability_note {
        pe.availability_note = Some(note.trim().to_string());
    }
    pe.updated_at = now();

    let tx = conn.unchecked_transaction()?;
    db::save_project_expert(&tx, &pe)?;
    for (kind, description) in events {
        log(&tx, &pe, actor, kind, description)?;
    }
    tx.commit()?;
    Ok(pe)
}

/// The client picked this expert.
pub fn select_expert(
    conn: &Connection,
    id: &Uuid,
    actor: Option<Uuid>,
) -> Result<ProjectExpert, DatabaseError> {
    let mut pe = db::require_project_expert(conn, id)?;
    ensure_transition(pe.status, ProjectExpertStatus::ClientSelected)?;
    ensure_pipeline_transition(pe.pipeline_status, PipelineStatus::Accepted)?;

    let now = now();
    pe.status = ProjectExpertStatus::ClientSelected;
    pe.pipeline_status = Some(PipelineStatus::Accepted);
    pe.selected_at = Some(now);
    pe.updated_at = now;

    let tx = conn.unchecked_transaction()?;
    db::save_project_expert(&tx, &pe)?;
    log(&tx, &pe, actor, ActivityType::ClientSelected, "Selected by client")?;
    tx.commit()?;
    Ok(pe)
}

/// Schedule the consultation: the assignment moves to scheduled and a
/// scheduled call record is opened for it.
pub fn schedule_call(
    conn: &Connection,
    id: &Uuid,
    request: &ScheduleCall,
    actor: Option<Uuid>,
) -> Result<(ProjectExpert, CallRecord), DatabaseError> {
    let mut pe = db::require_project_expert(conn, id)?;
    ensure_transition(pe.status, ProjectExpertStatus::Scheduled)?;

    let now = now();
    pe.status = ProjectExpertStatus::Scheduled;
    pe.scheduled_at = Some(now);
    pe.updated_at = now;

    let call = CallRecord {
        id: Uuid::new_v4(),
        project_id: pe.project_id,
        expert_id: pe.expert_id,
        project_expert_id: Some(pe.id),
        call_date: Some(request.call_date),
        duration_minutes: request.duration_minutes.unwrap_or(0),
        cu_used: 0.0,
        status: CallStatus::Scheduled,
        notes: request.notes.clone(),
        completed_at: None,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.unchecked_transaction()?;
    db::save_project_expert(&tx, &pe)?;
    db::insert_call_record(&tx, &call)?;
    log(
        &tx,
        &pe,
        actor,
        ActivityType::CallScheduled,
        format!("Call scheduled for {}", request.call_date.format("%Y-%m-%d %H:%M UTC")),
    )?;
    tx.commit()?;
    Ok((pe, call))
}

/// Remove an assignment, leaving a trace in the project log.
pub fn remove_assignment(conn: &Connection, id: &Uuid, actor: Option<Uuid>) -> Result<(), DatabaseError> {
    let pe = db::require_project_expert(conn, id)?;
    let tx = conn.unchecked_transaction()?;
    log(&tx, &pe, actor, ActivityType::ExpertRemoved, "Removed from project")?;
    db::delete_project_expert(&tx, id)?;
    tx.commit()?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Call records
// ═══════════════════════════════════════════════════════════

fn stamp_completion(call: &mut CallRecord) {
    call.cu_used = calculate_cu(call.duration_minutes);
    call.completed_at.get_or_insert_with(now);
}

/// Advance the linked assignment when its call completes, as far as its
/// graphs allow.
fn complete_assignment(
    conn: &Connection,
    call: &CallRecord,
    actor: Option<Uuid>,
) -> Result<(), DatabaseError> {
    let Some(pe_id) = call.project_expert_id else {
        return Ok(());
    };
    let Some(mut pe) = db::get_project_expert(conn, &pe_id)? else {
        return Ok(());
    };

    let mut changed = false;
    if pe.status != ProjectExpertStatus::Completed
        && pe.status.can_become(ProjectExpertStatus::Completed)
    {
        pe.status = ProjectExpertStatus::Completed;
        pe.completed_at = call.completed_at;
        changed = true;
    }
    if pe.pipeline_status == Some(PipelineStatus::Accepted) {
        pe.pipeline_status = Some(PipelineStatus::Completed);
        changed = true;
    }
    if changed {
        pe.updated_at = now();
        db::save_project_expert(conn, &pe)?;
    }
    log(
        conn,
        &pe,
        actor,
        ActivityType::CallCompleted,
        format!("Call completed ({} min, {} CU)", call.duration_minutes, call.cu_used),
    )
}

/// Log a call. Calls recorded as already completed are priced on insert.
pub fn create_call_record(
    conn: &Connection,
    new: &NewCallRecord,
    actor: Option<Uuid>,
) -> Result<CallRecord, DatabaseError> {
    db::require_project(conn, &new.project_id)?;
    db::require_expert(conn, &new.expert_id)?;
    if let Some(pe_id) = new.project_expert_id {
        let pe = db::require_project_expert(conn, &pe_id)?;
        if pe.project_id != new.project_id || pe.expert_id != new.expert_id {
            return Err(DatabaseError::ConstraintViolation(
                "project expert does not match project and expert".into(),
            ));
        }
    }

    let now = now();
    let mut call = CallRecord {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        expert_id: new.expert_id,
        project_expert_id: new.project_expert_id,
        call_date: new.call_date,
        duration_minutes: new.duration_minutes.unwrap_or(0),
        cu_used: 0.0,
        status: new.status.unwrap_or(CallStatus::Pending),
        notes: new.notes.clone(),
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    if call.status == CallStatus::Completed {
        stamp_completion(&mut call);
    }

    let tx = conn.unchecked_transaction()?;
    db::insert_call_record(&tx, &call)?;
    if call.status == CallStatus::Completed {
        complete_assignment(&tx, &call, actor)?;
    }
    tx.commit()?;

    tracing::info!(call_id = %call.id, status = %call.status, cu = call.cu_used, "Call recorded");
    Ok(call)
}

/// Edit a call. Moving to completed prices the call and completes the
/// assignment; duration edits on a completed call are re-priced.
pub fn update_call_record(
    conn: &Connection,
    id: &Uuid,
    update: &CallRecordUpdate,
    actor: Option<Uuid>,
) -> Result<CallRecord, DatabaseError> {
    let mut call = db::require_call_record(conn, id)?;
    let previous = call.status;

    if let Some(status) = update.status {
        ensure_transition(call.status, status)?;
        call.status = status;
    }
    if let Some(minutes) = update.duration_minutes {
        call.duration_minutes = minutes;
    }
    if let Some(date) = update.call_date {
        call.call_date = Some(date);
    }
    if let Some(notes) = &update.notes {
        call.notes = Some(notes.clone());
    }
    if call.status == CallStatus::Completed {
        stamp_completion(&mut call);
    }

    let tx = conn.unchecked_transaction()?;
    db::save_call_record(&tx, &call)?;
    if previous != call.status {
        match call.status {
            CallStatus::Completed => complete_assignment(&tx, &call, actor)?,
            CallStatus::Cancelled | CallStatus::NoShow => {
                db::insert_activity(
                    &tx,
                    &ProjectActivity::new(
                        call.project_id,
                        Some(call.expert_id),
                        actor,
                        ActivityType::CallCancelled,
                        format!("Call {}", call.status),
                    ),
                )?;
            }
            CallStatus::Pending | CallStatus::Scheduled => {}
        }
    }
    tx.commit()?;
    db::require_call_record(conn, id)
}

/// Record legacy usage; credits default to the CU of the duration.
pub fn record_usage(
    conn: &Connection,
    new: &NewUsageRecord,
    actor: Option<Uuid>,
) -> Result<UsageRecord, DatabaseError> {
    db::require_project(conn, &new.project_id)?;
    db::require_expert(conn, &new.expert_id)?;

    let record = UsageRecord {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        expert_id: new.expert_id,
        call_date: new.call_date,
        duration_minutes: new.duration_minutes,
        credits_used: new
            .credits_used
            .unwrap_or_else(|| calculate_cu(new.duration_minutes)),
        notes: new.notes.clone(),
        created_by: actor,
        created_at: now(),
    };
    db::insert_usage_record(conn, &record)?;
    Ok(record)
}
