use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::require_non_empty;
use crate::db::DatabaseError;

/// A provider search result from the maps service, cached locally.
///
/// `expires_at` is recorded with each row but nothing in this crate
/// reads it to evict entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMedicalPlace {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub place_types: Vec<String>,
    pub rating: Option<f64>,
    pub phone: Option<String>,
    pub cached_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCachedPlace {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub place_types: Vec<String>,
    pub rating: Option<f64>,
    pub phone: Option<String>,
    pub expires_at: NaiveDateTime,
}

impl NewCachedPlace {
    pub fn validate(&self) -> Result<(), DatabaseError> {
        require_non_empty("place_id", &self.place_id)?;
        require_non_empty("name", &self.name)?;
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DatabaseError::Validation {
                field: "coordinates".into(),
                reason: format!("({}, {}) is not a valid position", self.latitude, self.longitude),
            });
        }
        Ok(())
    }
}
