use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::Gender;
use super::{
    require_age, require_non_empty, HealthIndicator, MedicalHistoryEntry, ProfileAllergyDetail,
    ProfileMedicationDetail,
};
use crate::db::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    /// Opaque account reference from the authentication provider.
    pub owner_id: String,
    pub fullname: String,
    pub gender: Gender,
    pub age: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub owner_id: String,
    pub fullname: String,
    pub gender: Gender,
    pub age: i64,
}

impl NewProfile {
    pub fn validate(&self) -> Result<(), DatabaseError> {
        require_non_empty("owner_id", &self.owner_id)?;
        require_non_empty("fullname", &self.fullname)?;
        require_age(self.age)
    }
}

/// Partial update for a profile. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub fullname: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.gender.is_none() && self.age.is_none()
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if let Some(name) = &self.fullname {
            require_non_empty("fullname", name)?;
        }
        if let Some(age) = self.age {
            require_age(age)?;
        }
        Ok(())
    }
}

/// Everything stored for one profile, read in a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile: Profile,
    pub health: Option<HealthIndicator>,
    pub medications: Vec<ProfileMedicationDetail>,
    pub allergies: Vec<ProfileAllergyDetail>,
    pub history: Vec<MedicalHistoryEntry>,
}
