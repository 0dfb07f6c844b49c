use std::str::FromStr;

use rusqlite::{params, Connection};

use super::catalog::{CatalogRow, ALLERGIES};
use crate::db::DatabaseError;
use crate::models::enums::AllergySeverity;
use crate::models::*;

fn allergy_from_catalog(row: CatalogRow) -> Allergy {
    Allergy {
        id: row.id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
    }
}

pub fn get_profile_allergies(
    conn: &Connection,
    profile_id: i64,
) -> Result<Vec<ProfileAllergyDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT pa.id, pa.allergy_id, a.name, a.description, pa.severity
         FROM profile_allergies pa
         INNER JOIN allergies a ON a.id = pa.allergy_id
         WHERE pa.profile_id = ?1
         ORDER BY a.name COLLATE NOCASE, pa.id",
    )?;

    let rows = stmt.query_map(params![profile_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut allergies = Vec::new();
    for row in rows {
        let (id, allergy_id, name, description, severity) = row?;
        allergies.push(ProfileAllergyDetail {
            id,
            allergy_id,
            name,
            description,
            severity: severity.as_deref().map(AllergySeverity::from_str).transpose()?,
        });
    }
    Ok(allergies)
}

pub fn get_existing_allergy(
    conn: &Connection,
    name: &str,
) -> Result<Option<Allergy>, DatabaseError> {
    Ok(ALLERGIES.find_existing(conn, name)?.map(allergy_from_catalog))
}

pub fn get_allergies_suggestions(
    conn: &Connection,
    text: &str,
    limit: usize,
) -> Result<Vec<Allergy>, DatabaseError> {
    Ok(ALLERGIES
        .suggestions(conn, text, limit)?
        .into_iter()
        .map(allergy_from_catalog)
        .collect())
}

/// Insert a catalog row without deduplication.
pub fn insert_allergy(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> Result<i64, DatabaseError> {
    ALLERGIES.insert(conn, name, description)
}

pub fn link_allergy_to_profile(
    conn: &Connection,
    profile_id: i64,
    allergy_id: i64,
    severity: Option<AllergySeverity>,
) -> Result<ProfileLink, DatabaseError> {
    let severity = severity.map(|s| s.as_str());
    let (link_id, created) = ALLERGIES.link(conn, profile_id, allergy_id, ("severity", &severity))?;
    Ok(ProfileLink { link_id, catalog_id: allergy_id, created })
}

pub fn add_allergy_to_profile(
    conn: &Connection,
    profile_id: i64,
    name: &str,
    description: Option<&str>,
    severity: Option<AllergySeverity>,
) -> Result<ProfileLink, DatabaseError> {
    let severity = severity.map(|s| s.as_str());
    ALLERGIES.add_to_profile(conn, profile_id, name, description, ("severity", &severity))
}

pub fn update_profile_allergy(
    conn: &Connection,
    profile_id: i64,
    allergy_id: i64,
    severity: Option<AllergySeverity>,
) -> Result<bool, DatabaseError> {
    let severity = severity.map(|s| s.as_str());
    ALLERGIES.update_link(conn, profile_id, allergy_id, ("severity", &severity))
}

/// Unlink an allergy from a profile. The catalog row stays.
pub fn delete_allergy(
    conn: &Connection,
    profile_id: i64,
    allergy_id: i64,
) -> Result<bool, DatabaseError> {
    ALLERGIES.unlink(conn, profile_id, allergy_id)
}
