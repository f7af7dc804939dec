//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table. All public functions are re-exported here so
//! handlers can `use crate::db::*`.

mod activity;
mod call_record;
mod client;
mod expert;
mod invitation_link;
mod project;
mod project_expert;
mod session;
mod usage;
mod user;
mod vetting_question;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use activity::*;
pub use call_record::*;
pub use client::*;
pub use expert::*;
pub use invitation_link::*;
pub use project::*;
pub use project_expert::*;
pub use session::*;
pub use usage::*;
pub use user::*;
pub use vetting_question::*;

// ═══════════════════════════════════════════════════════════
// Column codecs: ids as UUID text, instants as RFC 3339 text
// ═══════════════════════════════════════════════════════════

/// Current instant at the precision we store (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn opt_ts(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(ts)
}

pub(crate) fn parse_id(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(format!("bad id {s}: {e}")))
}

pub(crate) fn parse_opt_id(s: Option<String>) -> Result<Option<Uuid>, DatabaseError> {
    s.as_deref().map(parse_id).transpose()
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {s}: {e}")))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.as_deref().map(parse_ts).transpose()
}

pub(crate) fn date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub(crate) fn opt_date(d: Option<NaiveDate>) -> Option<String> {
    d.as_ref().map(date)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {s}: {e}")))
}

pub(crate) fn parse_opt_date(s: Option<String>) -> Result<Option<NaiveDate>, DatabaseError> {
    s.as_deref().map(parse_date).transpose()
}

/// Map a zero-row UPDATE/DELETE to `NotFound`.
pub(crate) fn expect_affected(
    affected: usize,
    entity_type: &str,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    if affected == 0 {
        Err(DatabaseError::not_found(entity_type, id))
    } else {
        Ok(())
    }
}

/// Helper: builds a dynamic `AND ...` clause list with positional params.
#[derive(Default)]
pub(crate) struct FilterQuery {
    clauses: Vec<String>,
    params: Vec<Box<dyn rusqlite::types::ToSql>>,
}

impl FilterQuery {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `column <op> ?N` when `value` is present.
    pub(crate) fn push<T>(&mut self, column: &str, op: &str, value: Option<T>)
    where
        T: rusqlite::types::ToSql + 'static,
    {
        if let Some(v) = value {
            self.params.push(Box::new(v));
            self.clauses
                .push(format!(" AND {column} {op} ?{}", self.params.len()));
        }
    }

    /// Adds a case-insensitive substring match across several columns.
    pub(crate) fn search(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        self.params.push(Box::new(format!("%{term}%")));
        let idx = self.params.len();
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} LIKE ?{idx} COLLATE NOCASE"))
            .collect();
        self.clauses.push(format!(" AND ({})", ors.join(" OR ")));
    }

    pub(crate) fn sql_suffix(&self) -> String {
        self.clauses.join("")
    }

    pub(crate) fn param_refs(&self) -> Vec<&dyn rusqlite::types::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Seed helpers shared by repository and workflow tests.

    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::crypto::hash_password;
    use crate::models::*;

    pub fn user(conn: &Connection, email: &str, role: UserRole) -> User {
        let hash = hash_password("password-123");
        insert_user(
            conn,
            &NewUser {
                email: email.into(),
                name: email.split('@').next().unwrap_or(email).into(),
                role,
                password: "password-123".into(),
            },
            &hash,
        )
        .unwrap()
    }

    pub fn project(conn: &Connection, name: &str) -> Project {
        insert_project(
            conn,
            &NewProject {
                name: name.into(),
                client_organization_id: None,
                client_poc_id: None,
                pm_id: None,
                description: None,
                status: None,
                cu_budget: Some(20.0),
                start_date: None,
                due_date: None,
            },
        )
        .unwrap()
    }

    pub fn expert(conn: &Connection, name: &str, ra: Option<Uuid>) -> Expert {
        insert_expert(
            conn,
            &NewExpert {
                name: name.into(),
                sourced_by_ra_id: ra,
                ..Default::default()
            },
        )
        .unwrap()
    }

    pub fn assignment(conn: &Connection, project: &Project, expert: &Expert) -> ProjectExpert {
        insert_project_expert(
            conn,
            &NewProjectExpert {
                project_id: project.id,
                expert_id: expert.id,
            },
        )
        .unwrap()
    }
}
