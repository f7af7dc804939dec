use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, parse_id, parse_ts, ts};
use crate::crypto::PasswordHash;
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, email, name, role, is_active, created_at, updated_at";

struct UserRow {
    id: String,
    email: String,
    name: String,
    role: String,
    is_active: i32,
    created_at: String,
    updated_at: String,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_id(&row.id)?,
        email: row.email,
        name: row.name,
        role: UserRole::from_str(&row.role)?,
        is_active: row.is_active != 0,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

pub fn insert_user(
    conn: &Connection,
    new: &NewUser,
    password: &PasswordHash,
) -> Result<User, DatabaseError> {
    let now = now();
    let user = User {
        id: Uuid::new_v4(),
        email: new.email.trim().to_lowercase(),
        name: new.name.trim().to_string(),
        role: new.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO users (id, email, name, role, password_hash, password_salt, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
        params![
            user.id.to_string(),
            user.email,
            user.name,
            user.role.as_str(),
            password.hash,
            password.salt,
            ts(&now),
        ],
    )?;
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// Look up a user with their stored password material, for login.
pub fn get_user_credentials(
    conn: &Connection,
    email: &str,
) -> Result<Option<(User, PasswordHash)>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {USER_COLUMNS}, password_hash, password_salt FROM users WHERE email = ?1"
            ),
            params![email.trim().to_lowercase()],
            |row| {
                Ok((
                    user_row_from_rusqlite(row)?,
                    PasswordHash {
                        hash: row.get(7)?,
                        salt: row.get(8)?,
                    },
                ))
            },
        )
        .optional()?;
    match row {
        Some((user, hash)) => Ok(Some((user_from_row(user)?, hash))),
        None => Ok(None),
    }
}

pub fn get_password_hash(conn: &Connection, id: &Uuid) -> Result<PasswordHash, DatabaseError> {
    conn.query_row(
        "SELECT password_hash, password_salt FROM users WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(PasswordHash {
                hash: row.get(0)?,
                salt: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("user", id))
}

pub fn set_password(
    conn: &Connection,
    id: &Uuid,
    password: &PasswordHash,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET password_hash = ?1, password_salt = ?2, updated_at = ?3 WHERE id = ?4",
        params![password.hash, password.salt, ts(&now()), id.to_string()],
    )?;
    expect_affected(affected, "user", id)
}

pub fn list_users(conn: &Connection, role: Option<UserRole>) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![role.map(|r| r.as_str())], user_row_from_rusqlite)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

pub fn update_user(conn: &Connection, id: &Uuid, update: &UserUpdate) -> Result<User, DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET
            name = COALESCE(?1, name),
            role = COALESCE(?2, role),
            is_active = COALESCE(?3, is_active),
            updated_at = ?4
         WHERE id = ?5",
        params![
            update.name.as_deref().map(str::trim),
            update.role.map(|r| r.as_str()),
            update.is_active.map(i32::from),
            ts(&now()),
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "user", id)?;
    get_user(conn, id)?.ok_or_else(|| DatabaseError::not_found("user", id))
}

pub fn delete_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
    expect_affected(affected, "user", id)
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}
