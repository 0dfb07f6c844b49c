use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Shared catalog entry, reused across profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A profile's medication: the junction row joined with its catalog entry.
/// `id` is the junction row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMedicationDetail {
    pub id: i64,
    pub medication_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permanent: bool,
}
