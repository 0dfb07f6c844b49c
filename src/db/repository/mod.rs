//! Repository layer — entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection` and is stateless.
//! Absent rows come back as `Ok(None)`, an empty `Vec` or `Ok(false)`;
//! only driver, constraint and validation failures are errors.

mod allergy;
mod catalog;
mod health_indicator;
mod medical_history;
mod medication;
mod place;
mod profile;

use chrono::NaiveDateTime;

use super::DatabaseError;

pub use allergy::*;
pub use health_indicator::*;
pub use medical_history::*;
pub use medication::*;
pub use place::*;
pub use profile::*;

/// Format SQLite's `datetime('now')` produces.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| DatabaseError::CorruptValue {
        field: "timestamp".into(),
        value: value.into(),
        reason: e.to_string(),
    })
}

pub(crate) fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Escape `%`, `_` and `\` so user text matches literally inside a
/// `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
