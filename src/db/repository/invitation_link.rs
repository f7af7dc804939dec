use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, opt_ts, parse_id, parse_opt_id, parse_opt_ts, parse_ts, ts, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const LINK_COLUMNS: &str = "id, token, invite_type, project_id, ra_id, expert_id, created_by, \
     is_active, expires_at, used_at, created_at";

struct InvitationLinkRow {
    id: String,
    token: String,
    invite_type: String,
    project_id: Option<String>,
    ra_id: Option<String>,
    expert_id: Option<String>,
    created_by: Option<String>,
    is_active: i32,
    expires_at: Option<String>,
    used_at: Option<String>,
    created_at: String,
}

fn link_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<InvitationLinkRow, rusqlite::Error> {
    Ok(InvitationLinkRow {
        id: row.get(0)?,
        token: row.get(1)?,
        invite_type: row.get(2)?,
        project_id: row.get(3)?,
        ra_id: row.get(4)?,
        expert_id: row.get(5)?,
        created_by: row.get(6)?,
        is_active: row.get(7)?,
        expires_at: row.get(8)?,
        used_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn link_from_row(row: InvitationLinkRow) -> Result<InvitationLink, DatabaseError> {
    Ok(InvitationLink {
        id: parse_id(&row.id)?,
        token: row.token,
        invite_type: InviteType::from_str(&row.invite_type)?,
        project_id: parse_opt_id(row.project_id)?,
        ra_id: parse_opt_id(row.ra_id)?,
        expert_id: parse_opt_id(row.expert_id)?,
        created_by: parse_opt_id(row.created_by)?,
        is_active: row.is_active != 0,
        expires_at: parse_opt_ts(row.expires_at)?,
        used_at: parse_opt_ts(row.used_at)?,
        created_at: parse_ts(&row.created_at)?,
    })
}

pub fn insert_invitation_link(conn: &Connection, link: &InvitationLink) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO expert_invitation_links ({LINK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            link.id.to_string(),
            link.token,
            link.invite_type.as_str(),
            link.project_id.map(|id| id.to_string()),
            link.ra_id.map(|id| id.to_string()),
            link.expert_id.map(|id| id.to_string()),
            link.created_by.map(|id| id.to_string()),
            i32::from(link.is_active),
            opt_ts(&link.expires_at),
            opt_ts(&link.used_at),
            ts(&link.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_invitation_link(conn: &Connection, id: &Uuid) -> Result<Option<InvitationLink>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {LINK_COLUMNS} FROM expert_invitation_links WHERE id = ?1"),
        params![id.to_string()],
        link_row_from_rusqlite,
    )
    .optional()?
    .map(link_from_row)
    .transpose()
}

pub fn get_invitation_link_by_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<InvitationLink>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {LINK_COLUMNS} FROM expert_invitation_links WHERE token = ?1"),
        params![token],
        link_row_from_rusqlite,
    )
    .optional()?
    .map(link_from_row)
    .transpose()
}

pub fn list_invitation_links(
    conn: &Connection,
    filter: &InvitationLinkFilter,
) -> Result<Vec<InvitationLink>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push("project_id", "=", filter.project_id.map(|id| id.to_string()));
    q.push("ra_id", "=", filter.ra_id.map(|id| id.to_string()));
    q.push(
        "invite_type",
        "=",
        filter.invite_type.map(|t| t.as_str().to_string()),
    );
    if filter.active_only.unwrap_or(false) {
        q.push("is_active", "=", Some(1));
    }

    let mut sql = format!(
        "SELECT {LINK_COLUMNS} FROM expert_invitation_links WHERE 1=1{}",
        q.sql_suffix()
    );
    if filter.active_only.unwrap_or(false) {
        sql.push_str(" AND used_at IS NULL");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), link_row_from_rusqlite)?;

    let mut links = Vec::new();
    for row in rows {
        links.push(link_from_row(row?)?);
    }
    Ok(links)
}

/// Consume a link. Only one caller can win; the loser gets `false`.
pub fn mark_invitation_link_used(
    conn: &Connection,
    id: &Uuid,
    used_at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE expert_invitation_links SET used_at = ?1
         WHERE id = ?2 AND used_at IS NULL AND is_active = 1",
        params![ts(&used_at), id.to_string()],
    )?;
    Ok(affected == 1)
}

pub fn deactivate_invitation_link(conn: &Connection, id: &Uuid) -> Result<InvitationLink, DatabaseError> {
    let affected = conn.execute(
        "UPDATE expert_invitation_links SET is_active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    expect_affected(affected, "invitation_link", id)?;
    get_invitation_link(conn, id)?.ok_or_else(|| DatabaseError::not_found("invitation_link", id))
}
