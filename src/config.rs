use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "MedProfile";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MEDPROFILE_DATA_DIR";
/// Environment variable overriding the default log filter.
pub const LOG_FILTER_ENV: &str = "MEDPROFILE_LOG";

pub const DEFAULT_DB_FILE_NAME: &str = "medprofile.db";
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
/// Autocomplete is not queried below this many characters.
pub const DEFAULT_MIN_SUGGESTION_CHARS: usize = 2;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medprofile=info"
}

/// Get the application data directory.
///
/// Platform local-data directory (e.g. `~/.local/share/MedProfile`),
/// falling back to the working directory when none is known.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Configuration handed to [`crate::store::ProfileStore`] and
/// [`crate::init_tracing`]. Passed explicitly; nothing reads it globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub suggestion_limit: usize,
    pub min_suggestion_chars: usize,
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: app_data_dir(),
            db_file_name: DEFAULT_DB_FILE_NAME.into(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_suggestion_chars: DEFAULT_MIN_SUGGESTION_CHARS,
            log_filter: default_log_filter().into(),
        }
    }
}

impl StoreConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Full path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }
}
