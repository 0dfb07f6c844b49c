//! Cache of geocoded provider search results.
//!
//! Rows carry an `expires_at` stamp supplied by the caller. Nothing here
//! filters or evicts on it; readers decide what to do with stale rows.

use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

struct PlaceRow {
    place_id: String,
    name: String,
    address: Option<String>,
    latitude: f64,
    longitude: f64,
    place_types: String,
    rating: Option<f64>,
    phone: Option<String>,
    cached_at: String,
    expires_at: String,
}

fn place_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlaceRow> {
    Ok(PlaceRow {
        place_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        place_types: row.get(5)?,
        rating: row.get(6)?,
        phone: row.get(7)?,
        cached_at: row.get(8)?,
        expires_at: row.get(9)?,
    })
}

fn place_from_row(row: PlaceRow) -> Result<CachedMedicalPlace, DatabaseError> {
    Ok(CachedMedicalPlace {
        place_id: row.place_id,
        name: row.name,
        address: row.address,
        latitude: row.latitude,
        longitude: row.longitude,
        place_types: serde_json::from_str(&row.place_types)?,
        rating: row.rating,
        phone: row.phone,
        cached_at: parse_timestamp(&row.cached_at)?,
        expires_at: parse_timestamp(&row.expires_at)?,
    })
}

/// Insert or refresh a cached place. Refreshing resets `cached_at`.
pub fn upsert_cached_place(conn: &Connection, place: &NewCachedPlace) -> Result<(), DatabaseError> {
    place.validate()?;
    let place_types = serde_json::to_string(&place.place_types)?;

    conn.execute(
        "INSERT INTO cached_medical_places
         (place_id, name, address, latitude, longitude, place_types, rating, phone, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(place_id) DO UPDATE SET
           name = excluded.name,
           address = excluded.address,
           latitude = excluded.latitude,
           longitude = excluded.longitude,
           place_types = excluded.place_types,
           rating = excluded.rating,
           phone = excluded.phone,
           cached_at = datetime('now'),
           expires_at = excluded.expires_at",
        params![
            place.place_id,
            place.name,
            place.address,
            place.latitude,
            place.longitude,
            place_types,
            place.rating,
            place.phone,
            format_timestamp(&place.expires_at),
        ],
    )?;
    Ok(())
}

pub fn get_cached_place(
    conn: &Connection,
    place_id: &str,
) -> Result<Option<CachedMedicalPlace>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT place_id, name, address, latitude, longitude, place_types, rating, phone, cached_at, expires_at
         FROM cached_medical_places WHERE place_id = ?1",
    )?;

    match stmt.query_row(params![place_id], place_row_from_rusqlite) {
        Ok(row) => Ok(Some(place_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_cached_places(conn: &Connection) -> Result<Vec<CachedMedicalPlace>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT place_id, name, address, latitude, longitude, place_types, rating, phone, cached_at, expires_at
         FROM cached_medical_places ORDER BY name COLLATE NOCASE, place_id",
    )?;

    let rows = stmt.query_map([], place_row_from_rusqlite)?;

    let mut places = Vec::new();
    for row in rows {
        places.push(place_from_row(row?)?);
    }
    Ok(places)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::NaiveDate;

    fn clinic(place_id: &str, name: &str) -> NewCachedPlace {
        NewCachedPlace {
            place_id: place_id.into(),
            name: name.into(),
            address: Some("1 Main St".into()),
            latitude: 40.7128,
            longitude: -74.006,
            place_types: vec!["doctor".into(), "health".into()],
            rating: Some(4.5),
            phone: None,
            expires_at: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let conn = open_memory_database().unwrap();
        let input = clinic("ChIJ-1", "City Clinic");
        upsert_cached_place(&conn, &input).unwrap();

        let cached = get_cached_place(&conn, "ChIJ-1").unwrap().unwrap();
        assert_eq!(cached.name, "City Clinic");
        assert_eq!(cached.place_types, ["doctor", "health"]);
        assert_eq!(cached.rating, Some(4.5));
        assert_eq!(cached.expires_at, input.expires_at);
    }

    #[test]
    fn expired_rows_are_still_returned() {
        let conn = open_memory_database().unwrap();
        upsert_cached_place(&conn, &clinic("ChIJ-old", "Old Clinic")).unwrap();
        let cached = get_cached_place(&conn, "ChIJ-old").unwrap().unwrap();
        assert!(cached.expires_at < cached.cached_at);
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let conn = open_memory_database().unwrap();
        upsert_cached_place(&conn, &clinic("ChIJ-2", "Before")).unwrap();
        let mut refreshed = clinic("ChIJ-2", "After");
        refreshed.place_types = vec!["hospital".into()];
        upsert_cached_place(&conn, &refreshed).unwrap();

        let all = list_cached_places(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "After");
        assert_eq!(all[0].place_types, ["hospital"]);
    }

    #[test]
    fn invalid_coordinates_rejected() {
        let conn = open_memory_database().unwrap();
        let mut bad = clinic("ChIJ-3", "Nowhere");
        bad.latitude = 123.0;
        assert!(matches!(
            upsert_cached_place(&conn, &bad),
            Err(DatabaseError::Validation { .. })
        ));
        assert!(get_cached_place(&conn, "ChIJ-3").unwrap().is_none());
    }
}
