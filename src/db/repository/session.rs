use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_id, ts};
use crate::db::DatabaseError;

/// Store a session keyed by the SHA-256 of its bearer token.
pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: &Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token_hash, user_id.to_string(), ts(&created_at), ts(&expires_at)],
    )?;
    Ok(())
}

/// Resolve a live session to its active user id.
///
/// Expired sessions and sessions of deactivated users resolve to `None`.
pub fn find_session_user(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, DatabaseError> {
    let id: Option<String> = conn
        .query_row(
            "SELECT s.user_id FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?1 AND s.expires_at > ?2 AND u.is_active = 1",
            params![token_hash, ts(&now)],
            |row| row.get(0),
        )
        .optional()?;
    id.as_deref().map(parse_id).transpose()
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(affected > 0)
}

/// Drop every session belonging to a user (password change, deactivation).
pub fn delete_user_sessions(conn: &Connection, user_id: &Uuid) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1",
        params![user_id.to_string()],
    )?)
}

pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![ts(&now)],
    )?)
}
