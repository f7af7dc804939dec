use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, opt_ts, parse_id, parse_opt_id, parse_opt_ts, parse_ts, ts, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const EXPERT_COLUMNS: &str = "id, name, email, phone, linkedin_url, job_title, company, country, \
     bio, expertise, sourced_by_ra_id, sourced_at, created_at, updated_at";

struct ExpertRow {
    id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    linkedin_url: Option<String>,
    job_title: Option<String>,
    company: Option<String>,
    country: Option<String>,
    bio: Option<String>,
    expertise: String,
    sourced_by_ra_id: Option<String>,
    sourced_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn expert_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ExpertRow, rusqlite::Error> {
    Ok(ExpertRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        linkedin_url: row.get(4)?,
        job_title: row.get(5)?,
        company: row.get(6)?,
        country: row.get(7)?,
        bio: row.get(8)?,
        expertise: row.get(9)?,
        sourced_by_ra_id: row.get(10)?,
        sourced_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn expert_from_row(row: ExpertRow) -> Result<Expert, DatabaseError> {
    Ok(Expert {
        id: parse_id(&row.id)?,
        name: row.name,
        email: row.email,
        phone: row.phone,
        linkedin_url: row.linkedin_url,
        job_title: row.job_title,
        company: row.company,
        country: row.country,
        bio: row.bio,
        expertise: serde_json::from_str(&row.expertise)?,
        sourced_by_ra_id: parse_opt_id(row.sourced_by_ra_id)?,
        sourced_at: parse_opt_ts(row.sourced_at)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim().to_string()).collect()
}

/// Lowercased email, or `None` when blank. The column is unique, so a blank
/// must be stored as NULL.
fn clean_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Insert an expert. When an RA is credited, `sourced_at` starts the
/// incentive eligibility window.
pub fn insert_expert(conn: &Connection, new: &NewExpert) -> Result<Expert, DatabaseError> {
    let now = now();
    let expert = Expert {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        email: clean_email(new.email.as_deref()),
        phone: new.phone.clone(),
        linkedin_url: new.linkedin_url.clone(),
        job_title: new.job_title.clone(),
        company: new.company.clone(),
        country: new.country.clone(),
        bio: new.bio.clone(),
        expertise: clean_tags(&new.expertise),
        sourced_by_ra_id: new.sourced_by_ra_id,
        sourced_at: new.sourced_by_ra_id.map(|_| now),
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        &format!(
            "INSERT INTO experts ({EXPERT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)"
        ),
        params![
            expert.id.to_string(),
            expert.name,
            expert.email,
            expert.phone,
            expert.linkedin_url,
            expert.job_title,
            expert.company,
            expert.country,
            expert.bio,
            serde_json::to_string(&expert.expertise)?,
            expert.sourced_by_ra_id.map(|id| id.to_string()),
            opt_ts(&expert.sourced_at),
            ts(&now),
        ],
    )?;
    Ok(expert)
}

pub fn get_expert(conn: &Connection, id: &Uuid) -> Result<Option<Expert>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {EXPERT_COLUMNS} FROM experts WHERE id = ?1"),
        params![id.to_string()],
        expert_row_from_rusqlite,
    )
    .optional()?
    .map(expert_from_row)
    .transpose()
}

pub fn require_expert(conn: &Connection, id: &Uuid) -> Result<Expert, DatabaseError> {
    get_expert(conn, id)?.ok_or_else(|| DatabaseError::not_found("expert", id))
}

pub fn list_experts(conn: &Connection, filter: &ExpertFilter) -> Result<Vec<Expert>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push(
        "sourced_by_ra_id",
        "=",
        filter.sourced_by_ra_id.map(|id| id.to_string()),
    );
    q.push("country", "=", filter.country.clone());
    q.search(
        &["name", "company", "job_title", "expertise", "bio"],
        filter.search.as_deref(),
    );

    let sql = format!(
        "SELECT {EXPERT_COLUMNS} FROM experts WHERE 1=1{} ORDER BY name COLLATE NOCASE",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), expert_row_from_rusqlite)?;

    let mut experts = Vec::new();
    for row in rows {
        experts.push(expert_from_row(row?)?);
    }
    Ok(experts)
}

/// Experts credited to an RA, oldest sourcing first.
pub fn list_experts_sourced_by(conn: &Connection, ra_id: &Uuid) -> Result<Vec<Expert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPERT_COLUMNS} FROM experts WHERE sourced_by_ra_id = ?1
         ORDER BY sourced_at, name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![ra_id.to_string()], expert_row_from_rusqlite)?;

    let mut experts = Vec::new();
    for row in rows {
        experts.push(expert_from_row(row?)?);
    }
    Ok(experts)
}

pub fn update_expert(
    conn: &Connection,
    id: &Uuid,
    update: &ExpertUpdate,
) -> Result<Expert, DatabaseError> {
    let expertise = update
        .expertise
        .as_deref()
        .map(|tags| serde_json::to_string(&clean_tags(tags)))
        .transpose()?;
    let affected = conn.execute(
        "UPDATE experts SET
            name = COALESCE(?1, name),
            email = CASE WHEN ?2 IS NULL THEN email WHEN ?2 = '' THEN NULL ELSE ?2 END,
            phone = COALESCE(?3, phone),
            linkedin_url = COALESCE(?4, linkedin_url),
            job_title = COALESCE(?5, job_title),
            company = COALESCE(?6, company),
            country = COALESCE(?7, country),
            bio = COALESCE(?8, bio),
            expertise = COALESCE(?9, expertise),
            updated_at = ?10
         WHERE id = ?11",
        params![
            update.name.as_deref().map(str::trim),
            update.email.as_deref().map(|e| e.trim().to_lowercase()),
            update.phone,
            update.linkedin_url,
            update.job_title,
            update.company,
            update.country,
            update.bio,
            expertise,
            ts(&now()),
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "expert", id)?;
    require_expert(conn, id)
}

pub fn delete_expert(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM experts WHERE id = ?1", params![id.to_string()])?;
    expect_affected(affected, "expert", id)
}

pub fn count_experts(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM experts", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn ra_sourced_expert_gets_sourced_at() {
        let conn = open_memory_database().unwrap();
        let ra = fixtures::user(&conn, "ra@example.com", UserRole::Ra);
        let sourced = fixtures::expert(&conn, "Sourced", Some(ra.id));
        let walk_in = fixtures::expert(&conn, "Walk-in", None);

        assert_eq!(sourced.sourced_at, Some(sourced.created_at));
        assert!(walk_in.sourced_at.is_none());
        assert_eq!(list_experts_sourced_by(&conn, &ra.id).unwrap().len(), 1);
    }

    #[test]
    fn expertise_round_trips_as_json() {
        let conn = open_memory_database().unwrap();
        let expert = insert_expert(
            &conn,
            &NewExpert {
                name: "Helena".into(),
                expertise: vec![" lithium ".into(), "mining".into()],
                ..Default::default()
            },
        )
        .unwrap();
        let stored = require_expert(&conn, &expert.id).unwrap();
        assert_eq!(stored.expertise, vec!["lithium", "mining"]);

        let found = list_experts(
            &conn,
            &ExpertFilter {
                search: Some("MINING".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn update_replaces_expertise_and_keeps_source() {
        let conn = open_memory_database().unwrap();
        let ra = fixtures::user(&conn, "ra@example.com", UserRole::Ra);
        let expert = fixtures::expert(&conn, "Bruno", Some(ra.id));
        let updated = update_expert(
            &conn,
            &expert.id,
            &ExpertUpdate {
                expertise: Some(vec!["ports".into()]),
                company: Some("Vale".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.expertise, vec!["ports"]);
        assert_eq!(updated.company.as_deref(), Some("Vale"));
        assert_eq!(updated.sourced_by_ra_id, Some(ra.id));
    }

    #[test]
    fn duplicate_email_is_a_constraint_error() {
        let conn = open_memory_database().unwrap();
        let new = NewExpert {
            name: "Caio".into(),
            email: Some("caio@example.com".into()),
            ..Default::default()
        };
        insert_expert(&conn, &new).unwrap();
        let err = insert_expert(
            &conn,
            &NewExpert {
                email: Some("CAIO@example.com".into()),
                ..new
            },
        )
        .unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn blank_emails_are_stored_as_null() {
        let conn = open_memory_database().unwrap();
        let blank = |name: &str| NewExpert {
            name: name.into(),
            email: Some("  ".into()),
            ..Default::default()
        };
        let first = insert_expert(&conn, &blank("Ana")).unwrap();
        let second = insert_expert(&conn, &blank("Beto")).unwrap();
        assert!(first.email.is_none());
        assert!(require_expert(&conn, &second.id).unwrap().email.is_none());

        let with_email = update_expert(
            &conn,
            &first.id,
            &ExpertUpdate {
                email: Some("ana@example.com".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(with_email.email.as_deref(), Some("ana@example.com"));

        let cleared = update_expert(
            &conn,
            &first.id,
            &ExpertUpdate {
                email: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(cleared.email.is_none());
        assert!(insert_expert(&conn, &blank("Caio")).is_ok());
    }
}
