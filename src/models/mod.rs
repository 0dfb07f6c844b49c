//! Entity, input and patch types for the health-profile store.
//!
//! Input types (`New*`) and patches are validated here, before any
//! statement reaches SQLite.

pub mod allergy;
pub mod enums;
pub mod health_indicator;
pub mod medical_history;
pub mod medication;
pub mod place;
pub mod profile;

pub use allergy::*;
pub use health_indicator::*;
pub use medical_history::*;
pub use medication::*;
pub use place::*;
pub use profile::*;

use crate::db::DatabaseError;

/// Upper bound accepted for a profile's age.
pub const MAX_AGE: i64 = 150;

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), DatabaseError> {
    if value.trim().is_empty() {
        return Err(DatabaseError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

pub(crate) fn require_age(age: i64) -> Result<(), DatabaseError> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err(DatabaseError::Validation {
            field: "age".into(),
            reason: format!("must be between 0 and {MAX_AGE}, got {age}"),
        });
    }
    Ok(())
}
