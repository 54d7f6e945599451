//! Settings for Jobsafe
//!
//! Backup retention and scheduling, duplicate-detection thresholds and the
//! store retry policy.

use serde::{Deserialize, Serialize};

use super::paths::JobsafePaths;
use crate::duplicates::DuplicateConfig;
use crate::error::{JobsafeError, JobsafeResult};
use crate::integrity::HashAlgorithm;
use crate::storage::RetryPolicy;

/// Snapshot retention and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Snapshots beyond this count are deleted oldest-first
    pub max_backups: usize,
    /// Seconds between scheduler ticks
    pub auto_backup_interval_secs: u64,
    /// `auto-backup` refuses to run without this unless forced
    pub auto_backup_enabled: bool,
    /// Digest used for new snapshots; existing ones verify by their prefix
    pub hash_algorithm: HashAlgorithm,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            max_backups: 10,
            auto_backup_interval_secs: 3600,
            auto_backup_enabled: false,
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

/// Settings for Jobsafe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema version for migration support
    pub schema_version: u32,

    pub backup: BackupSettings,

    pub duplicates: DuplicateConfig,

    pub store_retry: RetryPolicy,
}

/// Current settings schema
pub const SCHEMA_VERSION: u32 = 1;

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            backup: BackupSettings::default(),
            duplicates: DuplicateConfig::default(),
            store_retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &JobsafePaths) -> JobsafeResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| JobsafeError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| JobsafeError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &JobsafePaths) -> JobsafeResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| JobsafeError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| JobsafeError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
