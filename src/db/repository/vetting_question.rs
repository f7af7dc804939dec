use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, parse_id, parse_ts, ts};
use crate::db::DatabaseError;
use crate::models::*;

const VQ_COLUMNS: &str = "id, project_id, question, position, is_required, created_at";

struct VettingQuestionRow {
    id: String,
    project_id: String,
    question: String,
    position: i64,
    is_required: i32,
    created_at: String,
}

fn vq_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<VettingQuestionRow, rusqlite::Error> {
    Ok(VettingQuestionRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        question: row.get(2)?,
        position: row.get(3)?,
        is_required: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn vq_from_row(row: VettingQuestionRow) -> Result<VettingQuestion, DatabaseError> {
    Ok(VettingQuestion {
        id: parse_id(&row.id)?,
        project_id: parse_id(&row.project_id)?,
        question: row.question,
        position: row.position,
        is_required: row.is_required != 0,
        created_at: parse_ts(&row.created_at)?,
    })
}

/// Insert a question; without an explicit position it goes last.
pub fn insert_vetting_question(
    conn: &Connection,
    new: &NewVettingQuestion,
) -> Result<VettingQuestion, DatabaseError> {
    let position = match new.position {
        Some(p) => p,
        None => conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM vetting_questions WHERE project_id = ?1",
            params![new.project_id.to_string()],
            |row| row.get(0),
        )?,
    };
    let vq = VettingQuestion {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        question: new.question.trim().to_string(),
        position,
        is_required: new.is_required.unwrap_or(true),
        created_at: now(),
    };
    conn.execute(
        &format!("INSERT INTO vetting_questions ({VQ_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            vq.id.to_string(),
            vq.project_id.to_string(),
            vq.question,
            vq.position,
            i32::from(vq.is_required),
            ts(&vq.created_at),
        ],
    )?;
    Ok(vq)
}

pub fn get_vetting_question(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<VettingQuestion>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {VQ_COLUMNS} FROM vetting_questions WHERE id = ?1"),
        params![id.to_string()],
        vq_row_from_rusqlite,
    )
    .optional()?
    .map(vq_from_row)
    .transpose()
}

/// Questions for a project (or all projects), in display order.
pub fn list_vetting_questions(
    conn: &Connection,
    project_id: Option<&Uuid>,
) -> Result<Vec<VettingQuestion>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VQ_COLUMNS} FROM vetting_questions
         WHERE (?1 IS NULL OR project_id = ?1)
         ORDER BY project_id, position, created_at"
    ))?;
    let rows = stmt.query_map(
        params![project_id.map(|id| id.to_string())],
        vq_row_from_rusqlite,
    )?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(vq_from_row(row?)?);
    }
    Ok(questions)
}

pub fn update_vetting_question(
    conn: &Connection,
    id: &Uuid,
    update: &VettingQuestionUpdate,
) -> Result<VettingQuestion, DatabaseError> {
    let affected = conn.execute(
        "UPDATE vetting_questions SET
            question = COALESCE(?1, question),
            position = COALESCE(?2, position),
            is_required = COALESCE(?3, is_required)
         WHERE id = ?4",
        params![
            update.question.as_deref().map(str::trim),
            update.position,
            update.is_required.map(i32::from),
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "vetting_question", id)?;
    get_vetting_question(conn, id)?.ok_or_else(|| DatabaseError::not_found("vetting_question", id))
}

pub fn delete_vetting_question(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM vetting_questions WHERE id = ?1",
        params![id.to_string()],
    )?;
    expect_affected(affected, "vetting_question", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn ask(conn: &Connection, project: &Project, text: &str, position: Option<i64>) -> VettingQuestion {
        insert_vetting_question(
            conn,
            &NewVettingQuestion {
                project_id: project.id,
                question: text.into(),
                position,
                is_required: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn positions_append_when_omitted() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Vetting");
        let first = ask(&conn, &project, "Years in the industry?", None);
        let second = ask(&conn, &project, "Current employer?", None);
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert!(first.is_required);
    }

    #[test]
    fn list_is_ordered_by_position() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Vetting");
        ask(&conn, &project, "Second", Some(5));
        ask(&conn, &project, "First", Some(1));
        let other = fixtures::project(&conn, "Other");
        ask(&conn, &other, "Elsewhere", None);

        let listed = list_vetting_questions(&conn, Some(&project.id)).unwrap();
        let texts: Vec<_> = listed.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second"]);
    }

    #[test]
    fn update_and_delete() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Vetting");
        let q = ask(&conn, &project, "Old", None);
        let updated = update_vetting_question(
            &conn,
            &q.id,
            &VettingQuestionUpdate {
                is_required: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!updated.is_required);
        assert_eq!(updated.question, "Old");

        delete_vetting_question(&conn, &q.id).unwrap();
        assert!(get_vetting_question(&conn, &q.id).unwrap().is_none());
    }
}
