//! Shared plumbing for the two reference catalogs (medications, allergies)
//! and the junction tables that link them to profiles.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::{escape_like, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::{require_non_empty, ProfileLink};

/// Table layout of one catalog and its junction.
pub(super) struct Catalog {
    pub table: &'static str,
    pub junction: &'static str,
    pub ref_column: &'static str,
}

pub(super) const MEDICATIONS: Catalog = Catalog {
    table: "medications",
    junction: "profile_medications",
    ref_column: "medication_id",
};

pub(super) const ALLERGIES: Catalog = Catalog {
    table: "allergies",
    junction: "profile_allergies",
    ref_column: "allergy_id",
};

pub(super) struct CatalogRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

fn read_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<CatalogRow>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, name, description, created_at) = row?;
        entries.push(CatalogRow {
            id,
            name,
            description,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(entries)
}

impl Catalog {
    /// Case-insensitive (Unicode) exact name match; oldest row wins when
    /// duplicates exist.
    pub(super) fn find_exact(&self, conn: &Connection, name: &str) -> Result<Option<CatalogRow>, DatabaseError> {
        let sql = format!(
            "SELECT id, name, description, created_at FROM {}
             WHERE casefold(name) = casefold(?1) ORDER BY id LIMIT 1",
            self.table
        );
        Ok(read_rows(conn, &sql, params![name.trim()])?.into_iter().next())
    }

    /// Exact match first, then the oldest entry whose name starts with `name`.
    pub(super) fn find_existing(&self, conn: &Connection, name: &str) -> Result<Option<CatalogRow>, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(row) = self.find_exact(conn, name)? {
            return Ok(Some(row));
        }
        let sql = format!(
            "SELECT id, name, description, created_at FROM {}
             WHERE casefold(name) LIKE casefold(?1) ESCAPE '\\' ORDER BY id LIMIT 1",
            self.table
        );
        let pattern = format!("{}%", escape_like(name));
        Ok(read_rows(conn, &sql, params![pattern])?.into_iter().next())
    }

    /// Substring match for autocomplete, capped at `limit` rows.
    pub(super) fn suggestions(&self, conn: &Connection, text: &str, limit: usize) -> Result<Vec<CatalogRow>, DatabaseError> {
        let text = text.trim();
        if text.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, description, created_at FROM {}
             WHERE casefold(name) LIKE casefold(?1) ESCAPE '\\'
             ORDER BY casefold(name), id LIMIT ?2",
            self.table
        );
        let pattern = format!("%{}%", escape_like(text));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        read_rows(conn, &sql, params![pattern, limit])
    }

    /// Plain insert. Does not look for an existing row with the same name.
    pub(super) fn insert(&self, conn: &Connection, name: &str, description: Option<&str>) -> Result<i64, DatabaseError> {
        require_non_empty("name", name)?;
        let sql = format!("INSERT INTO {} (name, description) VALUES (?1, ?2)", self.table);
        conn.execute(&sql, params![name.trim(), description])?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns the junction row id for `(profile_id, ref_id)`, if linked.
    pub(super) fn link_id(&self, conn: &Connection, profile_id: i64, ref_id: i64) -> Result<Option<i64>, DatabaseError> {
        let sql = format!(
            "SELECT id FROM {} WHERE profile_id = ?1 AND {} = ?2",
            self.junction, self.ref_column
        );
        conn.query_row(&sql, params![profile_id, ref_id], |row| row.get::<_, i64>(0))
            .optional()
            .map_err(DatabaseError::from)
    }

    /// Insert the junction row unless the pair is already linked.
    ///
    /// `attribute` is the junction's per-relationship column
    /// (`permanent` or `severity`), written only on creation.
    pub(super) fn link(
        &self,
        conn: &Connection,
        profile_id: i64,
        ref_id: i64,
        attribute: (&str, &dyn rusqlite::ToSql),
    ) -> Result<(i64, bool), DatabaseError> {
        if let Some(id) = self.link_id(conn, profile_id, ref_id)? {
            return Ok((id, false));
        }
        let (column, value) = attribute;
        let sql = format!(
            "INSERT INTO {} (profile_id, {}, {column}) VALUES (?1, ?2, ?3)
             ON CONFLICT(profile_id, {}) DO NOTHING",
            self.junction, self.ref_column, self.ref_column
        );
        let inserted = conn.execute(&sql, params![profile_id, ref_id, value])?;
        if inserted == 0 {
            // Lost a race against another writer; the row exists now.
            let id = self.link_id(conn, profile_id, ref_id)?.ok_or_else(|| {
                DatabaseError::ConstraintViolation(format!(
                    "{} link ({profile_id}, {ref_id}) vanished after conflict",
                    self.junction
                ))
            })?;
            return Ok((id, false));
        }
        Ok((conn.last_insert_rowid(), true))
    }

    /// Find-or-create the catalog entry by exact name, then link it.
    /// Both steps run in one IMMEDIATE transaction.
    pub(super) fn add_to_profile(
        &self,
        conn: &Connection,
        profile_id: i64,
        name: &str,
        description: Option<&str>,
        attribute: (&str, &dyn rusqlite::ToSql),
    ) -> Result<ProfileLink, DatabaseError> {
        require_non_empty("name", name)?;
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

        let catalog_id = match self.find_exact(&tx, name)? {
            Some(row) => row.id,
            None => self.insert(&tx, name, description)?,
        };
        let (link_id, created) = self.link(&tx, profile_id, catalog_id, attribute)?;

        tx.commit()?;
        tracing::debug!(
            junction = self.junction,
            profile_id,
            catalog_id,
            created,
            "Catalog entry linked to profile"
        );
        Ok(ProfileLink { link_id, catalog_id, created })
    }

    /// Update the junction's attribute column. Returns whether a row changed.
    pub(super) fn update_link(
        &self,
        conn: &Connection,
        profile_id: i64,
        ref_id: i64,
        attribute: (&str, &dyn rusqlite::ToSql),
    ) -> Result<bool, DatabaseError> {
        let (column, value) = attribute;
        let sql = format!(
            "UPDATE {} SET {column} = ?1 WHERE profile_id = ?2 AND {} = ?3",
            self.junction, self.ref_column
        );
        Ok(conn.execute(&sql, params![value, profile_id, ref_id])? > 0)
    }

    /// Remove the junction row. The shared catalog row is kept.
    pub(super) fn unlink(&self, conn: &Connection, profile_id: i64, ref_id: i64) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE profile_id = ?1 AND {} = ?2",
            self.junction, self.ref_column
        );
        Ok(conn.execute(&sql, params![profile_id, ref_id])? > 0)
    }
}
