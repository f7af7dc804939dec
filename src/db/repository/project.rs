use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    expect_affected, now, opt_date, parse_id, parse_opt_date, parse_opt_id, parse_ts, ts,
    FilterQuery,
};
use crate::db::DatabaseError;
use crate::models::*;

const PROJECT_COLUMNS: &str = "id, name, client_organization_id, client_poc_id, pm_id, description, \
     status, cu_budget, start_date, due_date, created_at, updated_at";

struct ProjectRow {
    id: String,
    name: String,
    client_organization_id: Option<String>,
    client_poc_id: Option<String>,
    pm_id: Option<String>,
    description: Option<String>,
    status: String,
    cu_budget: Option<f64>,
    start_date: Option<String>,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

fn project_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProjectRow, rusqlite::Error> {
    Ok(ProjectRow {
        id: row.get(0)?,
        name: row.get(1)?,
        client_organization_id: row.get(2)?,
        client_poc_id: row.get(3)?,
        pm_id: row.get(4)?,
        description: row.get(5)?,
        status: row.get(6)?,
        cu_budget: row.get(7)?,
        start_date: row.get(8)?,
        due_date: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn project_from_row(row: ProjectRow) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: parse_id(&row.id)?,
        name: row.name,
        client_organization_id: parse_opt_id(row.client_organization_id)?,
        client_poc_id: parse_opt_id(row.client_poc_id)?,
        pm_id: parse_opt_id(row.pm_id)?,
        description: row.description,
        status: ProjectStatus::from_str(&row.status)?,
        cu_budget: row.cu_budget,
        start_date: parse_opt_date(row.start_date)?,
        due_date: parse_opt_date(row.due_date)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

pub fn insert_project(conn: &Connection, new: &NewProject) -> Result<Project, DatabaseError> {
    let now = now();
    let project = Project {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        client_organization_id: new.client_organization_id,
        client_poc_id: new.client_poc_id,
        pm_id: new.pm_id,
        description: new.description.clone(),
        status: new.status.unwrap_or(ProjectStatus::Active),
        cu_budget: new.cu_budget,
        start_date: new.start_date,
        due_date: new.due_date,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        &format!(
            "INSERT INTO projects ({PROJECT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)"
        ),
        params![
            project.id.to_string(),
            project.name,
            project.client_organization_id.map(|id| id.to_string()),
            project.client_poc_id.map(|id| id.to_string()),
            project.pm_id.map(|id| id.to_string()),
            project.description,
            project.status.as_str(),
            project.cu_budget,
            opt_date(project.start_date),
            opt_date(project.due_date),
            ts(&now),
        ],
    )?;
    Ok(project)
}

pub fn get_project(conn: &Connection, id: &Uuid) -> Result<Option<Project>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id.to_string()],
        project_row_from_rusqlite,
    )
    .optional()?
    .map(project_from_row)
    .transpose()
}

pub fn require_project(conn: &Connection, id: &Uuid) -> Result<Project, DatabaseError> {
    get_project(conn, id)?.ok_or_else(|| DatabaseError::not_found("project", id))
}

pub fn list_projects(conn: &Connection, filter: &ProjectFilter) -> Result<Vec<Project>, DatabaseError> {
    let mut q = FilterQuery::new();
    q.push("status", "=", filter.status.map(|s| s.as_str().to_string()));
    q.push(
        "client_organization_id",
        "=",
        filter.client_organization_id.map(|id| id.to_string()),
    );
    q.push("pm_id", "=", filter.pm_id.map(|id| id.to_string()));
    q.search(&["name", "description"], filter.search.as_deref());

    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE 1=1{} ORDER BY created_at DESC",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), project_row_from_rusqlite)?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(project_from_row(row?)?);
    }
    Ok(projects)
}

pub fn update_project(
    conn: &Connection,
    id: &Uuid,
    update: &ProjectUpdate,
) -> Result<Project, DatabaseError> {
    let affected = conn.execute(
        "UPDATE projects SET
            name = COALESCE(?1, name),
            client_organization_id = COALESCE(?2, client_organization_id),
            client_poc_id = COALESCE(?3, client_poc_id),
            pm_id = COALESCE(?4, pm_id),
            description = COALESCE(?5, description),
            status = COALESCE(?6, status),
            cu_budget = COALESCE(?7, cu_budget),
            start_date = COALESCE(?8, start_date),
            due_date = COALESCE(?9, due_date),
            updated_at = ?10
         WHERE id = ?11",
        params![
            update.name.as_deref().map(str::trim),
            update.client_organization_id.map(|id| id.to_string()),
            update.client_poc_id.map(|id| id.to_string()),
            update.pm_id.map(|id| id.to_string()),
            update.description,
            update.status.map(|s| s.as_str()),
            update.cu_budget,
            opt_date(update.start_date),
            opt_date(update.due_date),
            ts(&now()),
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "project", id)?;
    require_project(conn, id)
}

pub fn delete_project(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
    expect_affected(affected, "project", id)
}

/// Credits consumed by completed calls on a project.
pub fn project_cu_consumed(conn: &Connection, id: &Uuid) -> Result<f64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(cu_used), 0.0) FROM call_records
         WHERE project_id = ?1 AND status = 'completed'",
        params![id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn get_project_detail(conn: &Connection, id: &Uuid) -> Result<ProjectDetail, DatabaseError> {
    let project = require_project(conn, id)?;
    let consumed = project_cu_consumed(conn, id)?;
    Ok(ProjectDetail::new(project, consumed))
}

/// Project counts keyed by status, for the analytics summary.
pub fn count_projects_by_status(conn: &Connection) -> Result<Vec<(ProjectStatus, i64)>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT status, COUNT(*) FROM projects GROUP BY status ORDER BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut counts = Vec::new();
    for row in rows {
        let (status, n) = row?;
        counts.push((ProjectStatus::from_str(&status)?, n));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_expert, get_project_expert};
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    #[test]
    fn insert_defaults_to_active_and_round_trips_dates() {
        let conn = open_memory_database().unwrap();
        let mut new = NewProject {
            name: "  Lithium sourcing ".into(),
            client_organization_id: None,
            client_poc_id: None,
            pm_id: None,
            description: None,
            status: None,
            cu_budget: Some(12.5),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 28),
        };
        let project = insert_project(&conn, &new).unwrap();
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.name, "Lithium sourcing");

        let stored = require_project(&conn, &project.id).unwrap();
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(stored.created_at, project.created_at);

        new.status = Some(ProjectStatus::OnHold);
        assert_eq!(insert_project(&conn, &new).unwrap().status, ProjectStatus::OnHold);
    }

    #[test]
    fn list_filters_by_status_and_search() {
        let conn = open_memory_database().unwrap();
        let a = fixtures::project(&conn, "Copper outlook");
        fixtures::project(&conn, "Grid storage");
        update_project(
            &conn,
            &a.id,
            &ProjectUpdate {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

        let completed = list_projects(
            &conn,
            &ProjectFilter {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, a.id);

        let found = list_projects(
            &conn,
            &ProjectFilter {
                search: Some("grid".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grid storage");
    }

    #[test]
    fn delete_cascades_to_assignments() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Cascade");
        let expert = fixtures::expert(&conn, "Rui", None);
        let pe = fixtures::assignment(&conn, &project, &expert);

        delete_project(&conn, &project.id).unwrap();
        assert!(get_project_expert(&conn, &pe.id).unwrap().is_none());
        assert!(get_expert(&conn, &expert.id).unwrap().is_some());
    }

    #[test]
    fn detail_reports_cu_remaining() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Budgeted");
        let detail = get_project_detail(&conn, &project.id).unwrap();
        assert_eq!(detail.cu_consumed, 0.0);
        assert_eq!(detail.cu_remaining, Some(20.0));
    }

    #[test]
    fn counts_by_status() {
        let conn = open_memory_database().unwrap();
        fixtures::project(&conn, "One");
        fixtures::project(&conn, "Two");
        let counts = count_projects_by_status(&conn).unwrap();
        assert_eq!(counts, vec![(ProjectStatus::Active, 2)]);
    }
}
