use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_id, parse_opt_id, parse_ts, ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_activity(conn: &Connection, activity: &ProjectActivity) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO project_activities (id, project_id, expert_id, actor_id, activity_type, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            activity.id.to_string(),
            activity.project_id.to_string(),
            activity.expert_id.map(|id| id.to_string()),
            activity.actor_id.map(|id| id.to_string()),
            activity.activity_type.as_str(),
            activity.description,
            ts(&activity.created_at),
        ],
    )?;
    Ok(())
}

/// Activity feed for a project, newest first.
pub fn list_project_activity(
    conn: &Connection,
    project_id: &Uuid,
    limit: u32,
) -> Result<Vec<ProjectActivity>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, expert_id, actor_id, activity_type, description, created_at
         FROM project_activities WHERE project_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![project_id.to_string(), limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, project_id, expert_id, actor_id, activity_type, description, created_at) = row?;
        items.push(ProjectActivity {
            id: parse_id(&id)?,
            project_id: parse_id(&project_id)?,
            expert_id: parse_opt_id(expert_id)?,
            actor_id: parse_opt_id(actor_id)?,
            activity_type: ActivityType::from_str(&activity_type)?,
            description,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn feed_is_newest_first_and_limited() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "P");
        let expert = fixtures::expert(&conn, "E", None);
        for kind in [
            ActivityType::ExpertAssigned,
            ActivityType::ExpertInvited,
            ActivityType::ExpertAccepted,
        ] {
            insert_activity(
                &conn,
                &ProjectActivity::new(project.id, Some(expert.id), None, kind, kind.as_str()),
            )
            .unwrap();
        }

        let feed = list_project_activity(&conn, &project.id, 2).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].activity_type, ActivityType::ExpertAccepted);
        assert_eq!(feed[1].activity_type, ActivityType::ExpertInvited);
    }
}
