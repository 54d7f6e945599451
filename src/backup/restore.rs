//! Backup restoration for Jobsafe
//!
//! Restoring overwrites the live record set. Before it does, the current
//! live set is itself snapshotted so the restore can be undone.

use tracing::info;

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::{Application, BackupMetadata, BackupType};
use crate::storage::{write_json, PREFERENCES_KEY, SETTINGS_KEY};
use crate::validation::validate_applications;

use super::manager::BackupManager;

/// Tag carried by snapshots taken just before a restore or rollback
pub const PRE_RESTORE_TAG: &str = "pre-restore";

/// Result of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreResult {
    /// Snapshot that was restored
    pub restored: BackupMetadata,
    /// Records now in the live set
    pub applications: Vec<Application>,
    /// Snapshot of the live set taken beforehand, if it was non-empty
    pub safety_backup: Option<BackupMetadata>,
    pub preferences_restored: bool,
    pub settings_restored: bool,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} application(s)", self.applications.len())];
        if self.preferences_restored {
            parts.push("preferences".to_string());
        }
        if self.settings_restored {
            parts.push("settings".to_string());
        }

        let mut summary = format!(
            "Restored {} from backup {} ({})",
            parts.join(", "),
            self.restored.id,
            self.restored.version
        );
        if let Some(safety) = &self.safety_backup {
            summary.push_str(&format!("; previous data saved as backup {}", safety.id));
        }
        summary
    }
}

impl BackupManager {
    /// Restore the live set from snapshot `id`
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Corrupted` for an untrustworthy
    /// payload, `ValidationFailed` if the snapshot has critical errors. The
    /// live set is untouched in all three cases.
    pub fn restore_backup(&self, id: &str) -> JobsafeResult<RestoreResult> {
        self.restore_with(id, |_| "Pre-restore backup".to_string())
    }

    /// Restore like [`restore_backup`](Self::restore_backup), naming the
    /// target version in the safety snapshot's description
    pub fn rollback_to_version(&self, id: &str) -> JobsafeResult<RestoreResult> {
        self.restore_with(id, |target| {
            format!(
                "Pre-rollback backup (rolling back to version {})",
                target.version
            )
        })
    }

    fn restore_with(
        &self,
        id: &str,
        safety_description: impl Fn(&BackupMetadata) -> String,
    ) -> JobsafeResult<RestoreResult> {
        let snapshot = self.load_snapshot(id)?;

        let report = validate_applications(&snapshot.applications);
        if !report.is_valid() {
            return Err(JobsafeError::ValidationFailed {
                critical: report.critical_count(),
                summary: report.summary(),
            });
        }

        let current = self.load_applications()?;
        let safety_backup = if current.is_empty() {
            None
        } else {
            Some(self.create_backup_keeping(
                &current,
                &safety_description(&snapshot.metadata),
                BackupType::Migration,
                vec![PRE_RESTORE_TAG.to_string()],
                Some(snapshot.metadata.id.as_str()),
            )?)
        };

        self.save_applications(&snapshot.applications)?;

        let preferences_restored = match &snapshot.preferences {
            Some(preferences) => {
                write_json(self.store(), PREFERENCES_KEY, preferences)?;
                true
            }
            None => false,
        };
        let settings_restored = match &snapshot.settings {
            Some(settings) => {
                write_json(self.store(), SETTINGS_KEY, settings)?;
                true
            }
            None => false,
        };

        info!(
            id,
            version = %snapshot.metadata.version,
            applications = snapshot.applications.len(),
            safety_backup = safety_backup.as_ref().map(|m| m.id.as_str()).unwrap_or("none"),
            "restored backup"
        );

        Ok(RestoreResult {
            restored: snapshot.metadata,
            applications: snapshot.applications,
            safety_backup,
            preferences_restored,
            settings_restored,
        })
    }
}
