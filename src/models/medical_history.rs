use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::HistoryStatus;
use super::require_non_empty;
use crate::db::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub id: i64,
    pub profile_id: i64,
    pub condition: String,
    /// Free-form date as entered on the form.
    pub diagnosis_date: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub status: HistoryStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedicalHistoryEntry {
    pub condition: String,
    pub diagnosis_date: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub status: HistoryStatus,
}

impl NewMedicalHistoryEntry {
    pub fn new(condition: impl Into<String>, status: HistoryStatus) -> Self {
        Self {
            condition: condition.into(),
            diagnosis_date: None,
            treatment: None,
            notes: None,
            status,
        }
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        require_non_empty("condition", &self.condition)
    }
}

/// Partial update. For the optional text columns, `Some(None)` clears
/// the value while `None` leaves it as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryPatch {
    pub condition: Option<String>,
    pub diagnosis_date: Option<Option<String>>,
    pub treatment: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<HistoryStatus>,
}

impl MedicalHistoryPatch {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
            && self.diagnosis_date.is_none()
            && self.treatment.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if let Some(condition) = &self.condition {
            require_non_empty("condition", condition)?;
        }
        Ok(())
    }
}
