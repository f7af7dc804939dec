use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{date, opt_date, parse_date, parse_id, parse_opt_id, parse_ts, ts, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_usage_record(conn: &Connection, record: &UsageRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO usage_records (id, project_id, expert_id, call_date, duration_minutes,
            credits_used, notes, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            record.project_id.to_string(),
            record.expert_id.to_string(),
            date(&record.call_date),
            record.duration_minutes,
            record.credits_used,
            record.notes,
            record.created_by.map(|id| id.to_string()),
            ts(&record.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_usage_record(conn: &Connection, id: &Uuid) -> Result<Option<UsageRecord>, DatabaseError> {
    use rusqlite::OptionalExtension;

    let row = conn
        .query_row(
            "SELECT id, project_id, expert_id, call_date, duration_minutes, credits_used,
                    notes, created_by, created_at
             FROM usage_records WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, project_id, expert_id, call_date, duration, credits, notes, created_by, created_at)) => {
            Ok(Some(UsageRecord {
                id: parse_id(&id)?,
                project_id: parse_id(&project_id)?,
                expert_id: parse_id(&expert_id)?,
                call_date: parse_date(&call_date)?,
                duration_minutes: duration,
                credits_used: credits,
                notes,
                created_by: parse_opt_id(created_by)?,
                created_at: parse_ts(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}

/// Usage rows joined with project, client and expert names, newest first.
pub fn list_usage_report(
    conn: &Connection,
    filter: &UsageFilter,
) -> Result<Vec<UsageReportRow>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push("u.project_id", "=", filter.project_id.map(|id| id.to_string()));
    q.push("u.expert_id", "=", filter.expert_id.map(|id| id.to_string()));
    q.push(
        "p.client_organization_id",
        "=",
        filter.client_organization_id.map(|id| id.to_string()),
    );
    q.push("u.call_date", ">=", opt_date(filter.date_from));
    q.push("u.call_date", "<=", opt_date(filter.date_to));

    let sql = format!(
        "SELECT u.id, u.call_date, u.project_id, p.name, c.name, u.expert_id, e.name,
                u.duration_minutes, u.credits_used, u.notes
         FROM usage_records u
         JOIN projects p ON p.id = u.project_id
         JOIN experts e ON e.id = u.expert_id
         LEFT JOIN client_organizations c ON c.id = p.client_organization_id
         WHERE 1=1{}
         ORDER BY u.call_date DESC, u.created_at DESC",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, i64>(7)?,
            row.get::<_, f64>(8)?,
            row.get::<_, Option<String>>(9)?,
        ))
    })?;

    let mut report = Vec::new();
    for row in rows {
        let (id, call_date, project_id, project_name, client_name, expert_id, expert_name, duration, credits, notes) =
            row?;
        report.push(UsageReportRow {
            id: parse_id(&id)?,
            call_date: parse_date(&call_date)?,
            project_id: parse_id(&project_id)?,
            project_name,
            client_name,
            expert_id: parse_id(&expert_id)?,
            expert_name,
            duration_minutes: duration,
            credits_used: credits,
            notes,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, now};
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    fn usage(project: &Project, expert: &Expert, day: u32, credits: f64) -> UsageRecord {
        UsageRecord {
            id: Uuid::new_v4(),
            project_id: project.id,
            expert_id: expert.id,
            call_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            duration_minutes: 45,
            credits_used: credits,
            notes: Some("intro call".into()),
            created_by: None,
            created_at: now(),
        }
    }

    #[test]
    fn report_joins_names_and_filters_dates_inclusively() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Lithium");
        let expert = fixtures::expert(&conn, "Marta", None);
        for (day, credits) in [(1, 0.75), (15, 1.0), (31, 1.5)] {
            insert_usage_record(&conn, &usage(&project, &expert, day, credits)).unwrap();
        }

        let rows = list_usage_report(
            &conn,
            &UsageFilter {
                date_from: NaiveDate::from_ymd_opt(2025, 3, 1),
                date_to: NaiveDate::from_ymd_opt(2025, 3, 15),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].call_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(rows[0].project_name, "Lithium");
        assert_eq!(rows[0].expert_name, "Marta");
        assert!(rows[0].client_name.is_none());
    }

    #[test]
    fn stored_record_reads_back() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "P");
        let expert = fixtures::expert(&conn, "E", None);
        let record = usage(&project, &expert, 2, 0.75);
        insert_usage_record(&conn, &record).unwrap();

        let stored = get_usage_record(&conn, &record.id).unwrap().unwrap();
        assert_eq!(stored.call_date, record.call_date);
        assert_eq!(stored.credits_used, 0.75);
    }
}
