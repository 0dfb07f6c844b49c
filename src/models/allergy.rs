use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AllergySeverity;

/// Shared catalog entry, reused across profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAllergyDetail {
    pub id: i64,
    pub allergy_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub severity: Option<AllergySeverity>,
}

/// Outcome of linking a catalog entry to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    /// Junction row id (existing or newly created).
    pub link_id: i64,
    /// Catalog row id (existing or newly created).
    pub catalog_id: i64,
    /// False when the pair was already linked.
    pub created: bool,
}
