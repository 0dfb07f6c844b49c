use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{ConditionStatus, SmokerStatus};

/// Lifestyle/condition answers, exactly one row per profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicator {
    pub id: i64,
    pub profile_id: i64,
    pub diabetic: ConditionStatus,
    pub hypertensive: ConditionStatus,
    pub smoker: SmokerStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHealthIndicator {
    pub diabetic: ConditionStatus,
    pub hypertensive: ConditionStatus,
    pub smoker: SmokerStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthIndicatorPatch {
    pub diabetic: Option<ConditionStatus>,
    pub hypertensive: Option<ConditionStatus>,
    pub smoker: Option<SmokerStatus>,
}

impl HealthIndicatorPatch {
    pub fn is_empty(&self) -> bool {
        self.diabetic.is_none() && self.hypertensive.is_none() && self.smoker.is_none()
    }
}
