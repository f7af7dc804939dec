use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, opt_ts, parse_id, parse_opt_ts, parse_ts, ts, FilterQuery};
use crate::crypto::generate_token;
use crate::db::DatabaseError;
use crate::models::*;

const PE_COLUMNS: &str = "id, project_id, expert_id, status, invitation_status, pipeline_status, \
     invitation_token, assigned_at, invited_at, opened_at, responded_at, selected_at, \
     scheduled_at, completed_at, vq_answers, availability_note, updated_at";

struct ProjectExpertRow {
    id: String,
    project_id: String,
    expert_id: String,
    status: String,
    invitation_status: String,
    pipeline_status: Option<String>,
    invitation_token: String,
    assigned_at: String,
    invited_at: Option<String>,
    opened_at: Option<String>,
    responded_at: Option<String>,
    selected_at: Option<String>,
    scheduled_at: Option<String>,
    completed_at: Option<String>,
    vq_answers: String,
    availability_note: Option<String>,
    updated_at: String,
}

fn pe_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProjectExpertRow, rusqlite::Error> {
    Ok(ProjectExpertRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        expert_id: row.get(2)?,
        status: row.get(3)?,
        invitation_status: row.get(4)?,
        pipeline_status: row.get(5)?,
        invitation_token: row.get(6)?,
        assigned_at: row.get(7)?,
        invited_at: row.get(8)?,
        opened_at: row.get(9)?,
        responded_at: row.get(10)?,
        selected_at: row.get(11)?,
        scheduled_at: row.get(12)?,
        completed_at: row.get(13)?,
        vq_answers: row.get(14)?,
        availability_note: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn pe_from_row(row: ProjectExpertRow) -> Result<ProjectExpert, DatabaseError> {
    Ok(ProjectExpert {
        id: parse_id(&row.id)?,
        project_id: parse_id(&row.project_id)?,
        expert_id: parse_id(&row.expert_id)?,
        status: ProjectExpertStatus::from_str(&row.status)?,
        invitation_status: InvitationStatus::from_str(&row.invitation_status)?,
        pipeline_status: row
            .pipeline_status
            .as_deref()
            .map(PipelineStatus::from_str)
            .transpose()?,
        invitation_token: row.invitation_token,
        assigned_at: parse_ts(&row.assigned_at)?,
        invited_at: parse_opt_ts(row.invited_at)?,
        opened_at: parse_opt_ts(row.opened_at)?,
        responded_at: parse_opt_ts(row.responded_at)?,
        selected_at: parse_opt_ts(row.selected_at)?,
        scheduled_at: parse_opt_ts(row.scheduled_at)?,
        completed_at: parse_opt_ts(row.completed_at)?,
        vq_answers: serde_json::from_str(&row.vq_answers)?,
        availability_note: row.availability_note,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

/// Assign an expert to a project with a fresh quick-invite token.
pub fn insert_project_expert(
    conn: &Connection,
    new: &NewProjectExpert,
) -> Result<ProjectExpert, DatabaseError> {
    let now = now();
    let pe = ProjectExpert {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        expert_id: new.expert_id,
        status: ProjectExpertStatus::Assigned,
        invitation_status: InvitationStatus::NotInvited,
        pipeline_status: None,
        invitation_token: generate_token(),
        assigned_at: now,
        invited_at: None,
        opened_at: None,
        responded_at: None,
        selected_at: None,
        scheduled_at: None,
        completed_at: None,
        vq_answers: Vec::new(),
        availability_note: None,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO project_experts (id, project_id, expert_id, status, invitation_status,
            invitation_token, assigned_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            pe.id.to_string(),
            pe.project_id.to_string(),
            pe.expert_id.to_string(),
            pe.status.as_str(),
            pe.invitation_status.as_str(),
            pe.invitation_token,
            ts(&now),
        ],
    )?;
    Ok(pe)
}

pub fn get_project_expert(conn: &Connection, id: &Uuid) -> Result<Option<ProjectExpert>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PE_COLUMNS} FROM project_experts WHERE id = ?1"),
        params![id.to_string()],
        pe_row_from_rusqlite,
    )
    .optional()?
    .map(pe_from_row)
    .transpose()
}

pub fn require_project_expert(conn: &Connection, id: &Uuid) -> Result<ProjectExpert, DatabaseError> {
    get_project_expert(conn, id)?.ok_or_else(|| DatabaseError::not_found("project_expert", id))
}

pub fn get_project_expert_by_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<ProjectExpert>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PE_COLUMNS} FROM project_experts WHERE invitation_token = ?1"),
        params![token],
        pe_row_from_rusqlite,
    )
    .optional()?
    .map(pe_from_row)
    .transpose()
}

pub fn find_project_expert(
    conn: &Connection,
    project_id: &Uuid,
    expert_id: &Uuid,
) -> Result<Option<ProjectExpert>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PE_COLUMNS} FROM project_experts WHERE project_id = ?1 AND expert_id = ?2"),
        params![project_id.to_string(), expert_id.to_string()],
        pe_row_from_rusqlite,
    )
    .optional()?
    .map(pe_from_row)
    .transpose()
}

pub fn list_project_experts(
    conn: &Connection,
    filter: &ProjectExpertFilter,
) -> Result<Vec<ProjectExpert>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push("project_id", "=", filter.project_id.map(|id| id.to_string()));
    q.push("expert_id", "=", filter.expert_id.map(|id| id.to_string()));
    q.push("status", "=", filter.status.map(|s| s.as_str().to_string()));
    q.push(
        "pipeline_status",
        "=",
        filter.pipeline_status.map(|s| s.as_str().to_string()),
    );

    let sql = format!(
        "SELECT {PE_COLUMNS} FROM project_experts WHERE 1=1{} ORDER BY assigned_at",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), pe_row_from_rusqlite)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(pe_from_row(row?)?);
    }
    Ok(items)
}

/// Persist every mutable column of an assignment.
pub fn save_project_expert(conn: &Connection, pe: &ProjectExpert) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE project_experts SET
            status = ?1, invitation_status = ?2, pipeline_status = ?3,
            invited_at = ?4, opened_at = ?5, responded_at = ?6, selected_at = ?7,
            scheduled_at = ?8, completed_at = ?9, vq_answers = ?10,
            availability_note = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            pe.status.as_str(),
            pe.invitation_status.as_str(),
            pe.pipeline_status.map(|s| s.as_str()),
            opt_ts(&pe.invited_at),
            opt_ts(&pe.opened_at),
            opt_ts(&pe.responded_at),
            opt_ts(&pe.selected_at),
            opt_ts(&pe.scheduled_at),
            opt_ts(&pe.completed_at),
            serde_json::to_string(&pe.vq_answers)?,
            pe.availability_note,
            ts(&pe.updated_at),
            pe.id.to_string(),
        ],
    )?;
    expect_affected(affected, "project_expert", &pe.id)
}

/// Persist an expert's response only if none was recorded yet.
///
/// Returns `false` when another request already responded.
pub fn save_project_expert_response(
    conn: &Connection,
    pe: &ProjectExpert,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE project_experts SET
            status = ?1, invitation_status = ?2, pipeline_status = ?3,
            opened_at = ?4, responded_at = ?5, vq_answers = ?6,
            availability_note = ?7, updated_at = ?8
         WHERE id = ?9 AND responded_at IS NULL",
        params![
            pe.status.as_str(),
            pe.invitation_status.as_str(),
            pe.pipeline_status.map(|s| s.as_str()),
            opt_ts(&pe.opened_at),
            opt_ts(&pe.responded_at),
            serde_json::to_string(&pe.vq_answers)?,
            pe.availability_note,
            ts(&pe.updated_at),
            pe.id.to_string(),
        ],
    )?;
    Ok(affected == 1)
}

pub fn delete_project_expert(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM project_experts WHERE id = ?1",
        params![id.to_string()],
    )?;
    expect_affected(affected, "project_expert", id)
}

/// Assignment counts keyed by invitation status, for the analytics funnel.
pub fn count_by_invitation_status(
    conn: &Connection,
) -> Result<Vec<(InvitationStatus, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT invitation_status, COUNT(*) FROM project_experts
         GROUP BY invitation_status ORDER BY invitation_status",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut counts = Vec::new();
    for row in rows {
        let (status, n) = row?;
        counts.push((InvitationStatus::from_str(&status)?, n));
    }
    Ok(counts)
}
