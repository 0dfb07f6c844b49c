//! Async facade over the repository layer.
//!
//! `ProfileStore` owns one SQLite connection behind a mutex and runs each
//! operation on tokio's blocking pool. Callers await the result; the
//! connection serializes statements, and operations never overlap.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::db::{self, DatabaseError};
use crate::models::enums::AllergySeverity;
use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// Constraint or validation failure, as opposed to a driver/I-O fault.
    pub fn is_rejected_input(&self) -> bool {
        match self {
            Self::Database(e) => {
                e.is_constraint_violation()
                    || matches!(e, DatabaseError::Validation { .. } | DatabaseError::InvalidEnum { .. })
            }
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl ProfileStore {
    /// Open (or create) the database at `config.db_path()` and migrate it.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let path = config.db_path();
        let conn = tokio::task::spawn_blocking(move || db::open_database(&path)).await??;
        tracing::info!(path = %config.db_path().display(), "Profile store opened");
        Self::from_connection(conn, config)
    }

    /// In-memory store, mostly for tests and previews.
    pub fn open_in_memory(config: StoreConfig) -> Result<Self, StoreError> {
        let conn = db::open_memory_database()?;
        Self::from_connection(conn, config)
    }

    /// Wrap an already-migrated connection. The SQL functions the
    /// repository needs are (re)registered on it.
    pub fn from_connection(conn: Connection, config: StoreConfig) -> Result<Self, StoreError> {
        db::register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&*guard).map_err(StoreError::from)
        })
        .await?;

        if let Err(e) = &result {
            tracing::warn!(op, error = %e, "Store operation failed");
        }
        result
    }

    // ── Profiles ────────────────────────────────────────────

    pub async fn add_profile(
        &self,
        profile: NewProfile,
        health: NewHealthIndicator,
    ) -> Result<i64, StoreError> {
        self.run("add_profile", move |c| db::add_profile(c, &profile, &health)).await
    }

    pub async fn get_profile_by_id(&self, id: i64) -> Result<Option<Profile>, StoreError> {
        self.run("get_profile_by_id", move |c| db::get_profile_by_id(c, id)).await
    }

    pub async fn get_profile_record(&self, id: i64) -> Result<Option<ProfileRecord>, StoreError> {
        self.run("get_profile_record", move |c| db::get_profile_record(c, id)).await
    }

    pub async fn list_profiles_by_owner(&self, owner_id: String) -> Result<Vec<Profile>, StoreError> {
        self.run("list_profiles_by_owner", move |c| db::list_profiles_by_owner(c, &owner_id)).await
    }

    pub async fn update_profile(&self, id: i64, patch: ProfilePatch) -> Result<bool, StoreError> {
        self.run("update_profile", move |c| db::update_profile(c, id, &patch)).await
    }

    pub async fn delete_profile(&self, id: i64) -> Result<bool, StoreError> {
        self.run("delete_profile", move |c| db::delete_profile(c, id)).await
    }

    // ── Health indicators ───────────────────────────────────

    pub async fn get_profile_health_indicator_by_id(
        &self,
        profile_id: i64,
    ) -> Result<Option<HealthIndicator>, StoreError> {
        self.run("get_profile_health_indicator_by_id", move |c| {
            db::get_profile_health_indicator_by_id(c, profile_id)
        })
        .await
    }

    pub async fn update_health_indicator(
        &self,
        profile_id: i64,
        patch: HealthIndicatorPatch,
    ) -> Result<bool, StoreError> {
        self.run("update_health_indicator", move |c| {
            db::update_health_indicator(c, profile_id, &patch)
        })
        .await
    }

    // ── Medications ─────────────────────────────────────────

    pub async fn get_profile_medications(
        &self,
        profile_id: i64,
    ) -> Result<Vec<ProfileMedicationDetail>, StoreError> {
        self.run("get_profile_medications", move |c| db::get_profile_medications(c, profile_id)).await
    }

    pub async fn get_existing_medication(&self, name: String) -> Result<Option<Medication>, StoreError> {
        self.run("get_existing_medication", move |c| db::get_existing_medication(c, &name)).await
    }

    /// Autocomplete. Text shorter than `min_suggestion_chars` yields no
    /// suggestions without touching the database.
    pub async fn get_medications_suggestions(&self, text: String) -> Result<Vec<Medication>, StoreError> {
        if !self.accepts_suggestion_text(&text) {
            return Ok(Vec::new());
        }
        let limit = self.config.suggestion_limit;
        self.run("get_medications_suggestions", move |c| {
            db::get_medications_suggestions(c, &text, limit)
        })
        .await
    }

    pub async fn insert_medication(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<i64, StoreError> {
        self.run("insert_medication", move |c| {
            db::insert_medication(c, &name, description.as_deref())
        })
        .await
    }

    pub async fn add_medication_to_profile(
        &self,
        profile_id: i64,
        name: String,
        description: Option<String>,
        permanent: bool,
    ) -> Result<ProfileLink, StoreError> {
        self.run("add_medication_to_profile", move |c| {
            db::add_medication_to_profile(c, profile_id, &name, description.as_deref(), permanent)
        })
        .await
    }

    pub async fn link_medication_to_profile(
        &self,
        profile_id: i64,
        medication_id: i64,
        permanent: bool,
    ) -> Result<ProfileLink, StoreError> {
        self.run("link_medication_to_profile", move |c| {
            db::link_medication_to_profile(c, profile_id, medication_id, permanent)
        })
        .await
    }

    pub async fn update_profile_medication(
        &self,
        profile_id: i64,
        medication_id: i64,
        permanent: bool,
    ) -> Result<bool, StoreError> {
        self.run("update_profile_medication", move |c| {
            db::update_profile_medication(c, profile_id, medication_id, permanent)
        })
        .await
    }

    pub async fn delete_medication(&self, profile_id: i64, medication_id: i64) -> Result<bool, StoreError> {
        self.run("delete_medication", move |c| db::delete_medication(c, profile_id, medication_id)).await
    }

    // ── Allergies ───────────────────────────────────────────

    pub async fn get_profile_allergies(
        &self,
        profile_id: i64,
    ) -> Result<Vec<ProfileAllergyDetail>, StoreError> {
        self.run("get_profile_allergies", move |c| db::get_profile_allergies(c, profile_id)).await
    }

    pub async fn get_existing_allergy(&self, name: String) -> Result<Option<Allergy>, StoreError> {
        self.run("get_existing_allergy", move |c| db::get_existing_allergy(c, &name)).await
    }

    pub async fn get_allergies_suggestions(&self, text: String) -> Result<Vec<Allergy>, StoreError> {
        if !self.accepts_suggestion_text(&text) {
            return Ok(Vec::new());
        }
        let limit = self.config.suggestion_limit;
        self.run("get_allergies_suggestions", move |c| {
            db::get_allergies_suggestions(c, &text, limit)
        })
        .await
    }

    pub async fn insert_allergy(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<i64, StoreError> {
        self.run("insert_allergy", move |c| db::insert_allergy(c, &name, description.as_deref())).await
    }

    pub async fn add_allergy_to_profile(
        &self,
        profile_id: i64,
        name: String,
        description: Option<String>,
        severity: Option<AllergySeverity>,
    ) -> Result<ProfileLink, StoreError> {
        self.run("add_allergy_to_profile", move |c| {
            db::add_allergy_to_profile(c, profile_id, &name, description.as_deref(), severity)
        })
        .await
    }

    pub async fn link_allergy_to_profile(
        &self,
        profile_id: i64,
        allergy_id: i64,
        severity: Option<AllergySeverity>,
    ) -> Result<ProfileLink, StoreError> {
        self.run("link_allergy_to_profile", move |c| {
            db::link_allergy_to_profile(c, profile_id, allergy_id, severity)
        })
        .await
    }

    pub async fn update_profile_allergy(
        &self,
        profile_id: i64,
        allergy_id: i64,
        severity: Option<AllergySeverity>,
    ) -> Result<bool, StoreError> {
        self.run("update_profile_allergy", move |c| {
            db::update_profile_allergy(c, profile_id, allergy_id, severity)
        })
        .await
    }

    pub async fn delete_allergy(&self, profile_id: i64, allergy_id: i64) -> Result<bool, StoreError> {
        self.run("delete_allergy", move |c| db::delete_allergy(c, profile_id, allergy_id)).await
    }

    // ── Medical history ─────────────────────────────────────

    pub async fn insert_medical_history_entry(
        &self,
        profile_id: i64,
        entry: NewMedicalHistoryEntry,
    ) -> Result<i64, StoreError> {
        self.run("insert_medical_history_entry", move |c| {
            db::insert_medical_history_entry(c, profile_id, &entry)
        })
        .await
    }

    pub async fn get_profile_medical_history_list(
        &self,
        profile_id: i64,
    ) -> Result<Vec<MedicalHistoryEntry>, StoreError> {
        self.run("get_profile_medical_history_list", move |c| {
            db::get_profile_medical_history_list(c, profile_id)
        })
        .await
    }

    pub async fn get_medical_history_entry(&self, id: i64) -> Result<Option<MedicalHistoryEntry>, StoreError> {
        self.run("get_medical_history_entry", move |c| db::get_medical_history_entry(c, id)).await
    }

    pub async fn update_medical_history_entry(
        &self,
        id: i64,
        patch: MedicalHistoryPatch,
    ) -> Result<bool, StoreError> {
        self.run("update_medical_history_entry", move |c| {
            db::update_medical_history_entry(c, id, &patch)
        })
        .await
    }

    pub async fn delete_medical_history(&self, id: i64) -> Result<bool, StoreError> {
        self.run("delete_medical_history", move |c| db::delete_medical_history(c, id)).await
    }

    // ── Places cache ────────────────────────────────────────

    pub async fn upsert_cached_place(&self, place: NewCachedPlace) -> Result<(), StoreError> {
        self.run("upsert_cached_place", move |c| db::upsert_cached_place(c, &place)).await
    }

    pub async fn get_cached_place(&self, place_id: String) -> Result<Option<CachedMedicalPlace>, StoreError> {
        self.run("get_cached_place", move |c| db::get_cached_place(c, &place_id)).await
    }

    pub async fn list_cached_places(&self) -> Result<Vec<CachedMedicalPlace>, StoreError> {
        self.run("list_cached_places", db::list_cached_places).await
    }

    fn accepts_suggestion_text(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.config.min_suggestion_chars
    }
}
