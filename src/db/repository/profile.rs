use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{
    get_profile_allergies, get_profile_health_indicator_by_id, get_profile_medical_history_list,
    get_profile_medications, insert_health_indicator, parse_timestamp,
};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

// Internal row type for Profile mapping
struct ProfileRow {
    id: i64,
    owner_id: String,
    fullname: String,
    gender: String,
    age: i64,
    created_at: String,
    updated_at: String,
}

fn profile_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        fullname: row.get(2)?,
        gender: row.get(3)?,
        age: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn profile_from_row(row: ProfileRow) -> Result<Profile, DatabaseError> {
    Ok(Profile {
        id: row.id,
        owner_id: row.owner_id,
        fullname: row.fullname,
        gender: Gender::from_str(&row.gender)?,
        age: row.age,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

/// Insert a profile row on its own. Prefer [`add_profile`], which also
/// writes the health indicators.
pub fn insert_profile(conn: &Connection, profile: &NewProfile) -> Result<i64, DatabaseError> {
    profile.validate()?;
    conn.execute(
        "INSERT INTO profiles (owner_id, fullname, gender, age) VALUES (?1, ?2, ?3, ?4)",
        params![
            profile.owner_id,
            profile.fullname,
            profile.gender.as_str(),
            profile.age,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create a profile together with its health indicators.
///
/// Both rows are written in one transaction: a profile never exists
/// without its indicators, and vice versa.
pub fn add_profile(
    conn: &Connection,
    profile: &NewProfile,
    health: &NewHealthIndicator,
) -> Result<i64, DatabaseError> {
    profile.validate()?;
    let tx = conn.unchecked_transaction()?;
    let profile_id = insert_profile(&tx, profile)?;
    insert_health_indicator(&tx, profile_id, health)?;
    tx.commit()?;

    tracing::info!(profile_id, "Profile created");
    Ok(profile_id)
}

pub fn get_profile_by_id(conn: &Connection, id: i64) -> Result<Option<Profile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, fullname, gender, age, created_at, updated_at
         FROM profiles WHERE id = ?1",
    )?;

    match stmt.query_row(params![id], profile_row_from_rusqlite) {
        Ok(row) => Ok(Some(profile_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_profile_by_fullname(
    conn: &Connection,
    fullname: &str,
) -> Result<Option<Profile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, fullname, gender, age, created_at, updated_at
         FROM profiles WHERE fullname = ?1",
    )?;

    match stmt.query_row(params![fullname], profile_row_from_rusqlite) {
        Ok(row) => Ok(Some(profile_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All profiles owned by one authenticated account, by name.
pub fn list_profiles_by_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<Profile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, fullname, gender, age, created_at, updated_at
         FROM profiles WHERE owner_id = ?1
         ORDER BY fullname COLLATE NOCASE",
    )?;

    let rows = stmt.query_map(params![owner_id], profile_row_from_rusqlite)?;

    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(profile_from_row(row?)?);
    }
    Ok(profiles)
}

/// Read a profile with all of its dependent rows inside one read
/// transaction, so the parts are mutually consistent.
pub fn get_profile_record(
    conn: &Connection,
    id: i64,
) -> Result<Option<ProfileRecord>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let Some(profile) = get_profile_by_id(&tx, id)? else {
        return Ok(None);
    };
    let record = ProfileRecord {
        profile,
        health: get_profile_health_indicator_by_id(&tx, id)?,
        medications: get_profile_medications(&tx, id)?,
        allergies: get_profile_allergies(&tx, id)?,
        history: get_profile_medical_history_list(&tx, id)?,
    };
    tx.commit()?;
    Ok(Some(record))
}

/// Partial update. Returns `false` when the profile does not exist or the
/// patch is empty.
pub fn update_profile(
    conn: &Connection,
    id: i64,
    patch: &ProfilePatch,
) -> Result<bool, DatabaseError> {
    if patch.is_empty() {
        return Ok(false);
    }
    patch.validate()?;

    let changed = conn.execute(
        "UPDATE profiles SET
         fullname = COALESCE(?1, fullname),
         gender = COALESCE(?2, gender),
         age = COALESCE(?3, age),
         updated_at = datetime('now')
         WHERE id = ?4",
        params![
            patch.fullname,
            patch.gender.map(|g| g.as_str()),
            patch.age,
            id,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a profile. Health indicators, medication/allergy links and
/// history entries go with it through `ON DELETE CASCADE`.
pub fn delete_profile(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM profiles WHERE id = ?1", params![id])?;
    if deleted > 0 {
        tracing::info!(profile_id = id, "Profile deleted");
    }
    Ok(deleted > 0)
}
