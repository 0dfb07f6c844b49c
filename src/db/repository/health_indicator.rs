use std::str::FromStr;

use rusqlite::{params, Connection};

use super::parse_timestamp;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_health_indicator(
    conn: &Connection,
    profile_id: i64,
    health: &NewHealthIndicator,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO health_indicators (profile_id, diabetic, hypertensive, smoker)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            profile_id,
            health.diabetic.as_str(),
            health.hypertensive.as_str(),
            health.smoker.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Health indicators for a profile, looked up by the profile's id.
pub fn get_profile_health_indicator_by_id(
    conn: &Connection,
    profile_id: i64,
) -> Result<Option<HealthIndicator>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, profile_id, diabetic, hypertensive, smoker, created_at, updated_at
         FROM health_indicators WHERE profile_id = ?1",
    )?;

    let result = stmt.query_row(params![profile_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    });

    match result {
        Ok((id, profile_id, diabetic, hypertensive, smoker, created_at, updated_at)) => {
            Ok(Some(HealthIndicator {
                id,
                profile_id,
                diabetic: ConditionStatus::from_str(&diabetic)?,
                hypertensive: ConditionStatus::from_str(&hypertensive)?,
                smoker: SmokerStatus::from_str(&smoker)?,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Partial update keyed by profile id (the relation is one-to-one).
pub fn update_health_indicator(
    conn: &Connection,
    profile_id: i64,
    patch: &HealthIndicatorPatch,
) -> Result<bool, DatabaseError> {
    if patch.is_empty() {
        return Ok(false);
    }

    let changed = conn.execute(
        "UPDATE health_indicators SET
         diabetic = COALESCE(?1, diabetic),
         hypertensive = COALESCE(?2, hypertensive),
         smoker = COALESCE(?3, smoker),
         updated_at = datetime('now')
         WHERE profile_id = ?4",
        params![
            patch.diabetic.map(|s| s.as_str()),
            patch.hypertensive.map(|s| s.as_str()),
            patch.smoker.map(|s| s.as_str()),
            profile_id,
        ],
    )?;
    Ok(changed > 0)
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
                owner_id: "auth0|h".into(),
                fullname: "Indicator Tester".into(),
                gender: Gender::Male,
                age: 64,
            },
            &NewHealthIndicator {
                diabetic: ConditionStatus::No,
                hypertensive: ConditionStatus::No,
                smoker: SmokerStatus::Yes,
            },
        )
        .unwrap();
        (conn, id)
    }

    #[test]
    fn update_changes_only_patched_answers() {
        let (conn, profile_id) = setup();
        let patch = HealthIndicatorPatch {
            smoker: Some(SmokerStatus::Former),
            ..Default::default()
        };
        assert!(update_health_indicator(&conn, profile_id, &patch).unwrap());

        let hi = get_profile_health_indicator_by_id(&conn, profile_id).unwrap().unwrap();
        assert_eq!(hi.smoker, SmokerStatus::Former);
        assert_eq!(hi.diabetic, ConditionStatus::No);
        assert_eq!(hi.hypertensive, ConditionStatus::No);
    }

    #[test]
    fn update_for_unknown_profile_affects_nothing() {
        let (conn, _) = setup();
        let patch = HealthIndicatorPatch {
            diabetic: Some(ConditionStatus::Yes),
            ..Default::default()
        };
        assert!(!update_health_indicator(&conn, 404, &patch).unwrap());
        assert!(!update_health_indicator(&conn, 404, &HealthIndicatorPatch::default()).unwrap());
    }

    #[test]
    fn second_indicator_row_for_profile_is_rejected() {
        let (conn, profile_id) = setup();
        let err = insert_health_indicator(
            &conn,
            profile_id,
            &NewHealthIndicator {
                diabetic: ConditionStatus::Yes,
                hypertensive: ConditionStatus::Yes,
                smoker: SmokerStatus::No,
            },
        )
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn out_of_vocabulary_values_are_rejected_by_schema() {
        let (conn, profile_id) = setup();
        let raw = conn.execute(
            "UPDATE health_indicators SET smoker = 'I don''t know' WHERE profile_id = ?1",
            params![profile_id],
        );
        assert!(raw.is_err());
    }
}
