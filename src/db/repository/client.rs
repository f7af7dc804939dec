use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_affected, now, parse_id, parse_ts, ts};
use crate::db::DatabaseError;
use crate::models::*;

// ═══════════════════════════════════════════════════════════
// Client organizations
// ═══════════════════════════════════════════════════════════

const ORG_COLUMNS: &str = "id, name, industry, country, notes, created_at, updated_at";

struct ClientOrgRow {
    id: String,
    name: String,
    industry: Option<String>,
    country: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn org_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ClientOrgRow, rusqlite::Error> {
    Ok(ClientOrgRow {
        id: row.get(0)?,
        name: row.get(1)?,
        industry: row.get(2)?,
        country: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn org_from_row(row: ClientOrgRow) -> Result<ClientOrganization, DatabaseError> {
    Ok(ClientOrganization {
        id: parse_id(&row.id)?,
        name: row.name,
        industry: row.industry,
        country: row.country,
        notes: row.notes,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

pub fn insert_client_organization(
    conn: &Connection,
    new: &NewClientOrganization,
) -> Result<ClientOrganization, DatabaseError> {
    let now = now();
    let org = ClientOrganization {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        industry: new.industry.clone(),
        country: new.country.clone(),
        notes: new.notes.clone(),
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO client_organizations (id, name, industry, country, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            org.id.to_string(),
            org.name,
            org.industry,
            org.country,
            org.notes,
            ts(&now),
        ],
    )?;
    Ok(org)
}

pub fn get_client_organization(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ClientOrganization>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {ORG_COLUMNS} FROM client_organizations WHERE id = ?1"),
        params![id.to_string()],
        org_row_from_rusqlite,
    )
    .optional()?
    .map(org_from_row)
    .transpose()
}

pub fn list_client_organizations(
    conn: &Connection,
    search: Option<&str>,
) -> Result<Vec<ClientOrganization>, DatabaseError> {
    let mut q = super::FilterQuery::new();
    q.search(&["name", "industry", "country"], search);
    let sql = format!(
        "SELECT {ORG_COLUMNS} FROM client_organizations WHERE 1=1{} ORDER BY name COLLATE NOCASE",
        q.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(q.param_refs().as_slice(), org_row_from_rusqlite)?;

    let mut orgs = Vec::new();
    for row in rows {
        orgs.push(org_from_row(row?)?);
    }
    Ok(orgs)
}

pub fn update_client_organization(
    conn: &Connection,
    id: &Uuid,
    update: &ClientOrganizationUpdate,
) -> Result<ClientOrganization, DatabaseError> {
    let affected = conn.execute(
        "UPDATE client_organizations SET
            name = COALESCE(?1, name),
            industry = COALESCE(?2, industry),
            country = COALESCE(?3, country),
            notes = COALESCE(?4, notes),
            updated_at = ?5
         WHERE id = ?6",
        params![
            update.name.as_deref().map(str::trim),
            update.industry,
            update.country,
            update.notes,
            ts(&now()),
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "client_organization", id)?;
    get_client_organization(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("client_organization", id))
}

pub fn delete_client_organization(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM client_organizations WHERE id = ?1",
        params![id.to_string()],
    )?;
    expect_affected(affected, "client_organization", id)
}

// ═══════════════════════════════════════════════════════════
// Client points of contact
// ═══════════════════════════════════════════════════════════

const POC_COLUMNS: &str = "id, organization_id, name, email, phone, job_title, created_at";

struct ClientPocRow {
    id: String,
    organization_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    job_title: Option<String>,
    created_at: String,
}

fn poc_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ClientPocRow, rusqlite::Error> {
    Ok(ClientPocRow {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        job_title: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn poc_from_row(row: ClientPocRow) -> Result<ClientPoc, DatabaseError> {
    Ok(ClientPoc {
        id: parse_id(&row.id)?,
        organization_id: parse_id(&row.organization_id)?,
        name: row.name,
        email: row.email,
        phone: row.phone,
        job_title: row.job_title,
        created_at: parse_ts(&row.created_at)?,
    })
}

pub fn insert_client_poc(conn: &Connection, new: &NewClientPoc) -> Result<ClientPoc, DatabaseError> {
    let poc = ClientPoc {
        id: Uuid::new_v4(),
        organization_id: new.organization_id,
        name: new.name.trim().to_string(),
        email: new.email.clone(),
        phone: new.phone.clone(),
        job_title: new.job_title.clone(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO client_pocs (id, organization_id, name, email, phone, job_title, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            poc.id.to_string(),
            poc.organization_id.to_string(),
            poc.name,
            poc.email,
            poc.phone,
            poc.job_title,
            ts(&poc.created_at),
        ],
    )?;
    Ok(poc)
}

pub fn get_client_poc(conn: &Connection, id: &Uuid) -> Result<Option<ClientPoc>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {POC_COLUMNS} FROM client_pocs WHERE id = ?1"),
        params![id.to_string()],
        poc_row_from_rusqlite,
    )
    .optional()?
    .map(poc_from_row)
    .transpose()
}

pub fn list_client_pocs(
    conn: &Connection,
    organization_id: Option<&Uuid>,
) -> Result<Vec<ClientPoc>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POC_COLUMNS} FROM client_pocs
         WHERE (?1 IS NULL OR organization_id = ?1)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(
        params![organization_id.map(|id| id.to_string())],
        poc_row_from_rusqlite,
    )?;

    let mut pocs = Vec::new();
    for row in rows {
        pocs.push(poc_from_row(row?)?);
    }
    Ok(pocs)
}

pub fn update_client_poc(
    conn: &Connection,
    id: &Uuid,
    update: &ClientPocUpdate,
) -> Result<ClientPoc, DatabaseError> {
    let affected = conn.execute(
        "UPDATE client_pocs SET
            name = COALESCE(?1, name),
            email = COALESCE(?2, email),
            phone = COALESCE(?3, phone),
            job_title = COALESCE(?4, job_title)
         WHERE id = ?5",
        params![
            update.name.as_deref().map(str::trim),
            update.email,
            update.phone,
            update.job_title,
            id.to_string(),
        ],
    )?;
    expect_affected(affected, "client_poc", id)?;
    get_client_poc(conn, id)?.ok_or_else(|| DatabaseError::not_found("client_poc", id))
}

pub fn delete_client_poc(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM client_pocs WHERE id = ?1", params![id.to_string()])?;
    expect_affected(affected, "client_poc", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn org(conn: &Connection, name: &str) -> ClientOrganization {
        insert_client_organization(
            conn,
            &NewClientOrganization {
                name: name.into(),
                industry: Some("Mining".into()),
                country: Some("Brazil".into()),
                notes: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn organizations_are_listed_by_name_and_searchable() {
        let conn = open_memory_database().unwrap();
        org(&conn, "Zeta Capital");
        org(&conn, "acme partners");

        let all = list_client_organizations(&conn, None).unwrap();
        assert_eq!(all[0].name, "acme partners");
        assert_eq!(all.len(), 2);

        let found = list_client_organizations(&conn, Some("zeta")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let conn = open_memory_database().unwrap();
        let o = org(&conn, "Acme");
        let updated = update_client_organization(
            &conn,
            &o.id,
            &ClientOrganizationUpdate {
                notes: Some("Prefers morning calls".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.industry.as_deref(), Some("Mining"));
        assert_eq!(updated.notes.as_deref(), Some("Prefers morning calls"));
    }

    #[test]
    fn deleting_organization_cascades_to_pocs() {
        let conn = open_memory_database().unwrap();
        let o = org(&conn, "Acme");
        let poc = insert_client_poc(
            &conn,
            &NewClientPoc {
                organization_id: o.id,
                name: "Joana".into(),
                email: Some("joana@acme.com".into()),
                phone: None,
                job_title: Some("Analyst".into()),
            },
        )
        .unwrap();
        assert_eq!(list_client_pocs(&conn, Some(&o.id)).unwrap().len(), 1);

        delete_client_organization(&conn, &o.id).unwrap();
        assert!(get_client_poc(&conn, &poc.id).unwrap().is_none());
    }

    #[test]
    fn poc_for_unknown_organization_violates_fk() {
        let conn = open_memory_database().unwrap();
        let err = insert_client_poc(
            &conn,
            &NewClientPoc {
                organization_id: Uuid::new_v4(),
                name: "Ghost".into(),
                email: None,
                phone: None,
                job_title: None,
            },
        )
        .unwrap_err();
        assert!(err.is_constraint());
    }
}
