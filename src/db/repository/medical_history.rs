use std::str::FromStr;

use rusqlite::{params, Connection};

use super::parse_timestamp;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

type HistoryRow = (
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
);

fn history_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn history_from_row(row: HistoryRow) -> Result<MedicalHistoryEntry, DatabaseError> {
    let (id, profile_id, condition, diagnosis_date, treatment, notes, status, created_at, updated_at) = row;
    Ok(MedicalHistoryEntry {
        id,
        profile_id,
        condition,
        diagnosis_date,
        treatment,
        notes,
        status: HistoryStatus::from_str(&status)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub fn insert_medical_history_entry(
    conn: &Connection,
    profile_id: i64,
    entry: &NewMedicalHistoryEntry,
) -> Result<i64, DatabaseError> {
    entry.validate()?;
    conn.execute(
        "INSERT INTO medical_history (profile_id, condition, diagnosis_date, treatment, notes, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            profile_id,
            entry.condition,
            entry.diagnosis_date,
            entry.treatment,
            entry.notes,
            entry.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History entries for a profile, most recent first.
pub fn get_profile_medical_history_list(
    conn: &Connection,
    profile_id: i64,
) -> Result<Vec<MedicalHistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, profile_id, condition, diagnosis_date, treatment, notes, status, created_at, updated_at
         FROM medical_history WHERE profile_id = ?1
         ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![profile_id], history_row_from_rusqlite)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(history_from_row(row?)?);
    }
    Ok(entries)
}

pub fn get_medical_history_entry(
    conn: &Connection,
    id: i64,
) -> Result<Option<MedicalHistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, profile_id, condition, diagnosis_date, treatment, notes, status, created_at, updated_at
         FROM medical_history WHERE id = ?1",
    )?;

    match stmt.query_row(params![id], history_row_from_rusqlite) {
        Ok(row) => Ok(Some(history_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_medical_history_entry(
    conn: &Connection,
    id: i64,
    patch: &MedicalHistoryPatch,
) -> Result<bool, DatabaseError> {
    if patch.is_empty() {
        return Ok(false);
    }
    patch.validate()?;

    // Optional text columns carry a "present" flag so they can be cleared.
    let changed = conn.execute(
        "UPDATE medical_history SET
         condition = COALESCE(?1, condition),
         diagnosis_date = CASE WHEN ?2 THEN ?3 ELSE diagnosis_date END,
         treatment = CASE WHEN ?4 THEN ?5 ELSE treatment END,
         notes = CASE WHEN ?6 THEN ?7 ELSE notes END,
         status = COALESCE(?8, status),
         updated_at = datetime('now')
         WHERE id = ?9",
        params![
            patch.condition,
            patch.diagnosis_date.is_some(),
            patch.diagnosis_date.clone().flatten(),
            patch.treatment.is_some(),
            patch.treatment.clone().flatten(),
            patch.notes.is_some(),
            patch.notes.clone().flatten(),
            patch.status.map(|s| s.as_str()),
            id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_medical_history(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    Ok(conn.execute("DELETE FROM medical_history WHERE id = ?1", params![id])? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::add_profile;
    use crate::db::sqlite::open_memory_database;

    fn setup() -> (Connection, i64) {
        let conn = open_memory_database().unwrap();
        let id = add_profile(
            &conn,
            &NewProfile {
                owner_id: "auth0|mh".into(),
                fullname: "History Tester".into(),
                gender: Gender::Female,
                age: 41,
            },
            &NewHealthIndicator {
                diabetic: ConditionStatus::No,
                hypertensive: ConditionStatus::Yes,
                smoker: SmokerStatus::No,
            },
        )
        .unwrap();
        (conn, id)
    }

    #[test]
    fn asthma_scenario() {
        let (conn, profile_id) = setup();
        insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry::new("Asthma", HistoryStatus::Ongoing),
        )
        .unwrap();

        let list = get_profile_medical_history_list(&conn, profile_id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].condition, "Asthma");
        assert_eq!(list[0].status, HistoryStatus::Ongoing);
    }

    #[test]
    fn condition_is_stored_verbatim() {
        let (conn, profile_id) = setup();
        let input = NewMedicalHistoryEntry::new(" Asthma ", HistoryStatus::Ongoing);
        let id = insert_medical_history_entry(&conn, profile_id, &input).unwrap();
        let entry = get_medical_history_entry(&conn, id).unwrap().unwrap();
        assert_eq!(entry.condition, input.condition);
    }

    #[test]
    fn list_is_newest_first_and_scoped() {
        let (conn, profile_id) = setup();
        let older = insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry::new("Chickenpox", HistoryStatus::Resolved),
        )
        .unwrap();
        let newer = insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry::new("Hypertension", HistoryStatus::Chronic),
        )
        .unwrap();

        let ids: Vec<_> = get_profile_medical_history_list(&conn, profile_id)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, [newer, older]);
        assert!(get_profile_medical_history_list(&conn, profile_id + 1).unwrap().is_empty());
    }

    #[test]
    fn update_sets_and_clears_optional_fields() {
        let (conn, profile_id) = setup();
        let id = insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry {
                condition: "Migraine".into(),
                diagnosis_date: Some("2019-05".into()),
                treatment: Some("Sumatriptan".into()),
                notes: Some("Triggered by stress".into()),
                status: HistoryStatus::Ongoing,
            },
        )
        .unwrap();

        let patch = MedicalHistoryPatch {
            status: Some(HistoryStatus::Chronic),
            notes: Some(None),
            ..Default::default()
        };
        assert!(update_medical_history_entry(&conn, id, &patch).unwrap());

        let entry = get_medical_history_entry(&conn, id).unwrap().unwrap();
        assert_eq!(entry.status, HistoryStatus::Chronic);
        assert_eq!(entry.notes, None);
        assert_eq!(entry.treatment.as_deref(), Some("Sumatriptan"));
        assert_eq!(entry.diagnosis_date.as_deref(), Some("2019-05"));
        assert_eq!(entry.condition, "Migraine");
    }

    #[test]
    fn blank_condition_rejected() {
        let (conn, profile_id) = setup();
        let err = insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry::new(" ", HistoryStatus::Ongoing),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation { .. }));

        let patch = MedicalHistoryPatch { condition: Some(String::new()), ..Default::default() };
        assert!(update_medical_history_entry(&conn, 1, &patch).is_err());
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let (conn, profile_id) = setup();
        let id = insert_medical_history_entry(
            &conn,
            profile_id,
            &NewMedicalHistoryEntry::new("Fracture", HistoryStatus::Resolved),
        )
        .unwrap();
        assert!(delete_medical_history(&conn, id).unwrap());
        assert!(!delete_medical_history(&conn, id).unwrap());
        assert!(get_medical_history_entry(&conn, id).unwrap().is_none());
    }
}
