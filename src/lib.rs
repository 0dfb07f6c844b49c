//! Local-first data layer for a personal health-profile tracker.
//!
//! Profiles, their health indicators, shared medication and allergy
//! catalogs, per-profile links and medical history live in one embedded
//! SQLite file. [`db`] holds the synchronous repository functions;
//! [`store::ProfileStore`] exposes them as async calls for UI code.

pub mod config;
pub mod db;
pub mod models;
pub mod store;

pub use config::StoreConfig;
pub use db::DatabaseError;
pub use store::{ProfileStore, StoreError};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, or by
/// `config.log_filter` when that is unset. Later calls are no-ops.
pub fn init_tracing(config: &StoreConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} data layer v{}", config::APP_NAME, config::APP_VERSION);
    }
}
