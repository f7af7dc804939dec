use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, opt_ts, parse_id, parse_opt_id, parse_opt_ts, parse_ts, ts, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const CALL_COLUMNS: &str = "id, project_id, expert_id, project_expert_id, call_date, duration_minutes, \
     cu_used, status, notes, completed_at, created_at, updated_at";

struct CallRecordRow {
    id: String,
    project_id: String,
    expert_id: String,
    project_expert_id: Option<String>,
    call_date: Option<String>,
    duration_minutes: i64,
    cu_used: f64,
    status: String,
    notes: Option<String>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn call_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CallRecordRow, rusqlite::Error> {
    Ok(CallRecordRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        expert_id: row.get(2)?,
        project_expert_id: row.get(3)?,
        call_date: row.get(4)?,
        duration_minutes: row.get(5)?,
        cu_used: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        completed_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn call_from_row(row: CallRecordRow) -> Result<CallRecord, DatabaseError> {
    Ok(CallRecord {
        id: parse_id(&row.id)?,
        project_id: parse_id(&row.project_id)?,
        expert_id: parse_id(&row.expert_id)?,
        project_expert_id: parse_opt_id(row.project_expert_id)?,
        call_date: parse_opt_ts(row.call_date)?,
        duration_minutes: row.duration_minutes,
        cu_used: row.cu_used,
        status: CallStatus::from_str(&row.status)?,
        notes: row.notes,
        completed_at: parse_opt_ts(row.completed_at)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

/// Insert a call record exactly as given; CU and status are the caller's concern.
pub fn insert_call_record(conn: &Connection, call: &CallRecord) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO call_records ({CALL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            call.id.to_string(),
            call.project_id.to_string(),
            call.expert_id.to_string(),
            call.project_expert_id.map(|id| id.to_string()),
            opt_ts(&call.call_date),
            call.duration_minutes,
            call.cu_used,
            call.status.as_str(),
            call.notes,
            opt_ts(&call.completed_at),
            ts(&call.created_at),
            ts(&call.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_call_record(conn: &Connection, id: &Uuid) -> Result<Option<CallRecord>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {CALL_COLUMNS} FROM call_records WHERE id = ?1"),
        params![id.to_string()],
        call_row_from_rusqlite,
    )
    .optional()?
    .map(call_from_row)
    .transpose()
}

pub fn require_call_record(conn: &Connection, id: &Uuid) -> Result<CallRecord, DatabaseError> {
    get_call_record(conn, id)?.ok_or_else(|| DatabaseError::not_found("call_record", id))
}

pub fn list_call_records(
    conn: &Connection,
    filter: &CallRecordFilter,
) -> Result<Vec<CallRecord>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push("project_id", "=", filter.project_id.map(|id| id.to_string()));
    q.push("expert_id", "=", filter.expert_id.map(|id| id.to_string()));
    q.push("status", "=", filter.status.map(|s| s.as_str().to_string()));

    let sql = format!(
        "SELECT {CALL_COLUMNS} FROM call_records WHERE 1=1{}
         ORDER BY COALESCE(call_date, completed_at, created_at) DESC",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), call_row_from_rusqlite)?;

    let mut calls = Vec::new();
    for row in rows {
        calls.push(call_from_row(row?)?);
    }
    Ok(calls)
}

/// Completed calls with experts credited to the given RA.
pub fn list_completed_calls_for_ra(
    conn: &Connection,
    ra_id: &Uuid,
) -> Result<Vec<CallRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM call_records c
         JOIN experts e ON e.id = c.expert_id
         WHERE e.sourced_by_ra_id = ?1 AND c.status = 'completed'",
        CALL_COLUMNS
            .split(", ")
            .map(|col| format!("c.{col}"))
            .collect::<Vec<_>>()
            .join(", ")
    ))?;
    let rows = stmt.query_map(params![ra_id.to_string()], call_row_from_rusqlite)?;

    let mut calls = Vec::new();
    for row in rows {
        calls.push(call_from_row(row?)?);
    }
    Ok(calls)
}

pub fn save_call_record(conn: &Connection, call: &CallRecord) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE call_records SET
            call_date = ?1, duration_minutes = ?2, cu_used = ?3, status = ?4,
            notes = ?5, completed_at = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            opt_ts(&call.call_date),
            call.duration_minutes,
            call.cu_used,
            call.status.as_str(),
            call.notes,
            opt_ts(&call.completed_at),
            ts(&now()),
            call.id.to_string(),
        ],
    )?;
    expect_affected(affected, "call_record", &call.id)
}

/// Completed call count and CU total across all projects.
pub fn completed_call_totals(conn: &Connection) -> Result<(i64, f64), DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(cu_used), 0.0) FROM call_records WHERE status = 'completed'",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?)
}
