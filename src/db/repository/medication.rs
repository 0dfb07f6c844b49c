use rusqlite::{params, Connection};

use super::catalog::{CatalogRow, MEDICATIONS};
use crate::db::DatabaseError;
use crate::models::*;

fn medication_from_catalog(row: CatalogRow) -> Medication {
    Medication {
        id: row.id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
    }
}

/// Medications linked to a profile, joined with their catalog entries.
pub fn get_profile_medications(
    conn: &Connection,
    profile_id: i64,
) -> Result<Vec<ProfileMedicationDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT pm.id, pm.medication_id, m.name, m.description, pm.permanent
         FROM profile_medications pm
         INNER JOIN medications m ON m.id = pm.medication_id
         WHERE pm.profile_id = ?1
         ORDER BY m.name COLLATE NOCASE, pm.id",
    )?;

    let rows = stmt.query_map(params![profile_id], |row| {
        Ok(ProfileMedicationDetail {
            id: row.get(0)?,
            medication_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            permanent: row.get::<_, i32>(4)? != 0,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Catalog lookup used to avoid inserting a duplicate medication:
/// case-insensitive exact match, falling back to a prefix match.
pub fn get_existing_medication(
    conn: &Connection,
    name: &str,
) -> Result<Option<Medication>, DatabaseError> {
    Ok(MEDICATIONS.find_existing(conn, name)?.map(medication_from_catalog))
}

/// Autocomplete over the medication catalog (`LIKE '%text%'`).
///
/// Any non-empty text is queried; the two-character minimum is enforced
/// by `ProfileStore`, not here.
pub fn get_medications_suggestions(
    conn: &Connection,
    text: &str,
    limit: usize,
) -> Result<Vec<Medication>, DatabaseError> {
    Ok(MEDICATIONS
        .suggestions(conn, text, limit)?
        .into_iter()
        .map(medication_from_catalog)
        .collect())
}

/// Insert a catalog row. Calling this twice with the same name creates
/// two rows; use [`add_medication_to_profile`] to deduplicate.
pub fn insert_medication(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> Result<i64, DatabaseError> {
    MEDICATIONS.insert(conn, name, description)
}

/// Link an existing catalog medication to a profile. Linking the same
/// pair twice keeps a single junction row.
pub fn link_medication_to_profile(
    conn: &Connection,
    profile_id: i64,
    medication_id: i64,
    permanent: bool,
) -> Result<ProfileLink, DatabaseError> {
    let permanent = permanent as i32;
    let (link_id, created) = MEDICATIONS.link(conn, profile_id, medication_id, ("permanent", &permanent))?;
    Ok(ProfileLink { link_id, catalog_id: medication_id, created })
}

/// Find-or-create the medication by name and link it to the profile.
pub fn add_medication_to_profile(
    conn: &Connection,
    profile_id: i64,
    name: &str,
    description: Option<&str>,
    permanent: bool,
) -> Result<ProfileLink, DatabaseError> {
    let permanent = permanent as i32;
    MEDICATIONS.add_to_profile(conn, profile_id, name, description, ("permanent", &permanent))
}

pub fn update_profile_medication(
    conn: &Connection,
    profile_id: i64,
    medication_id: i64,
    permanent: bool,
) -> Result<bool, DatabaseError> {
    let permanent = permanent as i32;
    MEDICATIONS.update_link(conn, profile_id, medication_id, ("permanent", &permanent))
}

/// Unlink a medication from a profile. The catalog row stays.
pub fn delete_medication(
    conn: &Connection,
    profile_id: i64,
    medication_id: i64,
) -> Result<bool, DatabaseError> {
    MEDICATIONS.unlink(conn, profile_id, medication_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{add_profile, get_profile_by_id};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;

    fn db_with_profile() -> (Connection, i64) {
        let conn = open_memory_database().unwrap();
        let id = add_profile(
            &conn,
            &NewProfile {
                owner_id: "auth0|m".into(),
                fullname: "Med Tester".into(),
                gender: Gender::Other,
                age: 52,
            },
            &NewHealthIndicator {
                diabetic: ConditionStatus::Yes,
                hypertensive: ConditionStatus::Unknown,
                smoker: SmokerStatus::Former,
            },
        )
        .unwrap();
        (conn, id)
    }

    #[test]
    fn insert_medication_twice_creates_two_catalog_rows() {
        let (conn, _) = db_with_profile();
        let a = insert_medication(&conn, "Aspirin", None).unwrap();
        let b = insert_medication(&conn, "Aspirin", None).unwrap();
        assert_ne!(a, b);
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM medications WHERE name = 'Aspirin'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn insert_medication_rejects_blank_name() {
        let (conn, _) = db_with_profile();
        assert!(matches!(
            insert_medication(&conn, "  ", None),
            Err(DatabaseError::Validation { .. })
        ));
    }

    #[test]
    fn linking_same_pair_twice_keeps_one_row() {
        let (conn, profile_id) = db_with_profile();
        let med_id = insert_medication(&conn, "Lisinopril", Some("ACE inhibitor")).unwrap();

        let first = link_medication_to_profile(&conn, profile_id, med_id, true).unwrap();
        let second = link_medication_to_profile(&conn, profile_id, med_id, false).unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.link_id, second.link_id);

        let meds = get_profile_medications(&conn, profile_id).unwrap();
        assert_eq!(meds.len(), 1);
        // Second link does not overwrite the relationship attribute.
        assert!(meds[0].permanent);
    }

    #[test]
    fn junction_pair_is_unique_at_storage_level() {
        let (conn, profile_id) = db_with_profile();
        let med_id = insert_medication(&conn, "Warfarin", None).unwrap();
        link_medication_to_profile(&conn, profile_id, med_id, false).unwrap();
        let raw = conn.execute(
            "INSERT INTO profile_medications (profile_id, medication_id) VALUES (?1, ?2)",
            params![profile_id, med_id],
        );
        assert!(raw.is_err());
    }

    #[test]
    fn add_by_name_reuses_catalog_entry_case_insensitively() {
        let (conn, profile_id) = db_with_profile();
        let first = add_medication_to_profile(&conn, profile_id, "Metformin", None, true).unwrap();
        let again = add_medication_to_profile(&conn, profile_id, "metformin", None, false).unwrap();

        assert!(first.created);
        assert!(!again.created);
        assert_eq!(first.catalog_id, again.catalog_id);

        let meds = get_profile_medications(&conn, profile_id).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Metformin");
        assert_eq!(meds[0].medication_id, first.catalog_id);
        assert_eq!(meds[0].id, first.link_id);
    }

    #[test]
    fn add_to_missing_profile_rolls_back_catalog_insert() {
        let (conn, _) = db_with_profile();
        let err = add_medication_to_profile(&conn, 4242, "Orphanol", None, false).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(get_existing_medication(&conn, "Orphanol").unwrap().is_none());
    }

    #[test]
    fn existing_lookup_prefers_exact_then_prefix() {
        let (conn, _) = db_with_profile();
        let para = insert_medication(&conn, "Paracetamol", None).unwrap();
        let para_short = insert_medication(&conn, "Para", None).unwrap();

        let exact = get_existing_medication(&conn, "PARA").unwrap().unwrap();
        assert_eq!(exact.id, para_short);

        let prefix = get_existing_medication(&conn, "paracet").unwrap().unwrap();
        assert_eq!(prefix.id, para);

        assert!(get_existing_medication(&conn, "cetamol").unwrap().is_none());
        assert!(get_existing_medication(&conn, "").unwrap().is_none());
    }

    #[test]
    fn suggestions_match_substrings_and_respect_limit() {
        let (conn, _) = db_with_profile();
        for name in ["Amoxicillin", "Ampicillin", "Penicillin V", "Cillinex", "Ibuprofen"] {
            insert_medication(&conn, name, None).unwrap();
        }

        let all = get_medications_suggestions(&conn, "cillin", 10).unwrap();
        let names: Vec<_> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Amoxicillin", "Ampicillin", "Cillinex", "Penicillin V"]);

        let capped = get_medications_suggestions(&conn, "CILLIN", 2).unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn single_character_suggestion_still_matches() {
        let (conn, _) = db_with_profile();
        insert_medication(&conn, "Aspirin", None).unwrap();
        insert_medication(&conn, "Zolpidem", None).unwrap();

        let hits = get_medications_suggestions(&conn, "a", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Aspirin");
    }

    #[test]
    fn accented_names_match_regardless_of_case() {
        let (conn, _) = db_with_profile();
        let id = insert_medication(&conn, "Ácido fólico", None).unwrap();

        let hits = get_medications_suggestions(&conn, "ácido", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(get_medications_suggestions(&conn, "FÓLICO", 5).unwrap().len(), 1);

        let exact = get_existing_medication(&conn, "ácido fólico").unwrap().unwrap();
        assert_eq!(exact.id, id);
        let prefix = get_existing_medication(&conn, "ÁCIDO F").unwrap().unwrap();
        assert_eq!(prefix.id, id);
    }

    #[test]
    fn add_by_accented_name_reuses_catalog_entry() {
        let (conn, profile_id) = db_with_profile();
        let first = add_medication_to_profile(&conn, profile_id, "Ácido fólico", None, true).unwrap();
        let again = add_medication_to_profile(&conn, profile_id, "ácido FÓLICO", None, false).unwrap();

        assert_eq!(first.catalog_id, again.catalog_id);
        assert!(!again.created);
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM medications", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(get_profile_medications(&conn, profile_id).unwrap().len(), 1);
    }

    #[test]
    fn suggestions_treat_wildcards_literally() {
        let (conn, _) = db_with_profile();
        insert_medication(&conn, "Vitamin D", None).unwrap();
        assert!(get_medications_suggestions(&conn, "%", 5).unwrap().is_empty());
        assert!(get_medications_suggestions(&conn, "   ", 5).unwrap().is_empty());
    }

    #[test]
    fn update_and_delete_only_touch_the_junction() {
        let (conn, profile_id) = db_with_profile();
        let link = add_medication_to_profile(&conn, profile_id, "Atorvastatin", None, false).unwrap();

        assert!(update_profile_medication(&conn, profile_id, link.catalog_id, true).unwrap());
        assert!(get_profile_medications(&conn, profile_id).unwrap()[0].permanent);

        assert!(delete_medication(&conn, profile_id, link.catalog_id).unwrap());
        assert!(!delete_medication(&conn, profile_id, link.catalog_id).unwrap());
        assert!(get_profile_medications(&conn, profile_id).unwrap().is_empty());
        assert!(get_existing_medication(&conn, "Atorvastatin").unwrap().is_some());
        assert!(get_profile_by_id(&conn, profile_id).unwrap().is_some());
        assert!(!update_profile_medication(&conn, profile_id, link.catalog_id, false).unwrap());
    }
}
