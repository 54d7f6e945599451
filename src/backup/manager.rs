//! Backup manager for Jobsafe
//!
//! Creates, lists, loads and deletes snapshots, and enforces the retention
//! cap. Payloads are stored under `backup_<id>` as the exact bytes the
//! checksum was computed over; the index entry carries size and checksum.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::BackupSettings;
use crate::diff::diff_record_sets;
use crate::error::{JobsafeError, JobsafeResult};
use crate::integrity::{new_backup_id, new_version_tag, verify_checksum, ChecksumStatus, ContentHasher};
use crate::models::{Application, BackupMetadata, BackupSnapshot, BackupType};
use crate::storage::{
    read_json, write_json, KeyValueStore, APPLICATIONS_KEY, PREFERENCES_KEY, SETTINGS_KEY,
};
use crate::validation::validate_applications;

use super::index::{IndexGuard, VersionIndex};

/// Manages snapshot creation, lookup and retention
pub struct BackupManager {
    store: Arc<dyn KeyValueStore>,
    index: VersionIndex,
    hasher: Box<dyn ContentHasher>,
    settings: BackupSettings,
}

impl BackupManager {
    /// Create a manager over `store`
    ///
    /// The hasher for new snapshots is chosen here, once.
    pub fn new(store: Arc<dyn KeyValueStore>, settings: BackupSettings) -> Self {
        Self {
            index: VersionIndex::new(Arc::clone(&store)),
            hasher: settings.hash_algorithm.hasher(),
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &BackupSettings {
        &self.settings
    }

    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    // Live data

    /// The live record set; an absent key is an empty set
    pub fn load_applications(&self) -> JobsafeResult<Vec<Application>> {
        Ok(read_json(self.store(), APPLICATIONS_KEY)?.unwrap_or_default())
    }

    /// Replace the live record set
    pub fn save_applications(&self, applications: &[Application]) -> JobsafeResult<()> {
        write_json(self.store(), APPLICATIONS_KEY, applications)
    }

    pub fn load_preferences(&self) -> JobsafeResult<Option<Value>> {
        read_json(self.store(), PREFERENCES_KEY)
    }

    pub fn load_settings_blob(&self) -> JobsafeResult<Option<Value>> {
        read_json(self.store(), SETTINGS_KEY)
    }

    /// A blob to carry in a snapshot; one that does not parse is left out
    fn ambient_blob(&self, key: &str) -> JobsafeResult<Option<Value>> {
        match read_json(self.store(), key) {
            Ok(value) => Ok(value),
            Err(JobsafeError::Json(e)) => {
                warn!(key, error = %e, "unreadable blob left out of backup");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // Snapshots

    /// Snapshot `applications` together with the ambient preferences
    ///
    /// Invalid record sets are stored anyway so nothing is lost; restoring
    /// them is what fails. The change summary is computed against the
    /// newest existing snapshot. Retention runs afterwards.
    pub fn create_backup(
        &self,
        applications: &[Application],
        description: &str,
        backup_type: BackupType,
        tags: Vec<String>,
    ) -> JobsafeResult<BackupMetadata> {
        self.create_backup_keeping(applications, description, backup_type, tags, None)
    }

    /// Create a snapshot whose retention pass never evicts `keep_id`
    pub(crate) fn create_backup_keeping(
        &self,
        applications: &[Application],
        description: &str,
        backup_type: BackupType,
        tags: Vec<String>,
        keep_id: Option<&str>,
    ) -> JobsafeResult<BackupMetadata> {
        let report = validate_applications(applications);
        if !report.is_valid() {
            warn!(
                critical = report.critical_count(),
                "backing up a record set with critical validation errors"
            );
        }

        let mut index = self.index.lock()?;
        let parent = index.newest().cloned();
        let changes = self.change_summary(parent.as_ref(), applications);

        let mut metadata = BackupMetadata {
            id: new_backup_id(),
            created_at: Utc::now(),
            version: new_version_tag(),
            description: description.to_string(),
            size_bytes: 0,
            checksum: String::new(),
            backup_type,
            application_count: applications.len(),
            parent_version: parent.map(|p| p.version),
            changes,
            tags,
        };

        let snapshot = BackupSnapshot {
            metadata: metadata.without_integrity(),
            applications: applications.to_vec(),
            preferences: self.ambient_blob(PREFERENCES_KEY)?,
            settings: self.ambient_blob(SETTINGS_KEY)?,
        };
        let payload = serde_json::to_vec(&snapshot)
            .map_err(|e| JobsafeError::Json(format!("Failed to serialize backup: {}", e)))?;

        metadata.size_bytes = payload.len() as u64;
        metadata.checksum = self.hasher.checksum(&payload);

        self.store.set(&metadata.payload_key(), &payload)?;
        index.push(metadata.clone());
        let mut protected = vec![metadata.id.as_str()];
        protected.extend(keep_id);
        let evicted = self.evict_excess(&mut index, &protected);
        index.commit()?;
        self.remove_payloads(&evicted);

        info!(
            id = %metadata.id,
            version = %metadata.version,
            kind = %metadata.backup_type,
            applications = metadata.application_count,
            bytes = metadata.size_bytes,
            "created backup"
        );

        Ok(metadata)
    }

    /// Snapshot the live record set
    pub fn create_backup_of_current(
        &self,
        description: &str,
        backup_type: BackupType,
        tags: Vec<String>,
    ) -> JobsafeResult<BackupMetadata> {
        let applications = self.load_applications()?;
        self.create_backup(&applications, description, backup_type, tags)
    }

    fn change_summary(
        &self,
        parent: Option<&BackupMetadata>,
        applications: &[Application],
    ) -> Vec<String> {
        let Some(parent) = parent else {
            return vec![format!(
                "Initial backup with {} application(s)",
                applications.len()
            )];
        };

        match self.read_snapshot(parent) {
            Ok(previous) => diff_record_sets(&previous.applications, applications).summary_lines(),
            Err(e) => {
                warn!(parent = %parent.id, error = %e, "previous backup unreadable, no change summary");
                Vec::new()
            }
        }
    }

    /// All snapshots, newest first
    ///
    /// Entries with equal timestamps keep the later-created one first.
    pub fn list_backups(&self) -> JobsafeResult<Vec<BackupMetadata>> {
        let mut entries = self.index.entries()?;
        entries.reverse();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Index entry for `id`
    pub fn get_backup(&self, id: &str) -> JobsafeResult<BackupMetadata> {
        self.index
            .entries()?
            .into_iter()
            .find(|meta| meta.id == id)
            .ok_or_else(|| JobsafeError::backup_not_found(id))
    }

    /// The newest snapshot's metadata, if any
    pub fn latest_backup(&self) -> JobsafeResult<Option<BackupMetadata>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Load and verify a snapshot
    ///
    /// # Errors
    ///
    /// `NotFound` if no snapshot has this id, `Corrupted` if its payload is
    /// missing, fails its checksum, or does not deserialize.
    pub fn load_snapshot(&self, id: &str) -> JobsafeResult<BackupSnapshot> {
        let metadata = self.get_backup(id)?;
        self.read_snapshot(&metadata)
    }

    pub(crate) fn read_snapshot(&self, metadata: &BackupMetadata) -> JobsafeResult<BackupSnapshot> {
        let payload = self
            .store
            .get(&metadata.payload_key())?
            .ok_or_else(|| JobsafeError::corrupted(&metadata.id, "payload missing"))?;

        match verify_checksum(&payload, &metadata.checksum) {
            ChecksumStatus::Match => {}
            ChecksumStatus::Mismatch { expected, actual } => {
                return Err(JobsafeError::corrupted(
                    &metadata.id,
                    format!("checksum mismatch (expected {}, got {})", expected, actual),
                ));
            }
            ChecksumStatus::UnknownAlgorithm(algorithm) => {
                return Err(JobsafeError::corrupted(
                    &metadata.id,
                    format!("unknown checksum algorithm '{}'", algorithm),
                ));
            }
        }

        let mut snapshot: BackupSnapshot = serde_json::from_slice(&payload).map_err(|e| {
            JobsafeError::corrupted(&metadata.id, format!("unreadable payload: {}", e))
        })?;
        snapshot.metadata = metadata.clone();
        Ok(snapshot)
    }

    /// Delete a snapshot and its index entry
    ///
    /// Returns whether an index entry was removed; deleting an absent
    /// snapshot succeeds and leaves the index untouched.
    pub fn delete_backup(&self, id: &str) -> JobsafeResult<bool> {
        let mut index = self.index.lock()?;
        let removed = index.remove(id);
        index.commit()?;
        self.store.remove(&crate::models::payload_key(id))?;

        match &removed {
            Some(meta) => info!(id, version = %meta.version, "deleted backup"),
            None => debug!(id, "delete of absent backup"),
        }
        Ok(removed.is_some())
    }

    /// Delete snapshots beyond the retention cap, oldest first
    pub fn enforce_retention(&self) -> JobsafeResult<Vec<BackupMetadata>> {
        let mut index = self.index.lock()?;
        let evicted = self.evict_excess(&mut index, &[]);
        index.commit()?;
        self.remove_payloads(&evicted);
        Ok(evicted)
    }

    /// A cap of zero keeps everything
    fn evict_excess(&self, index: &mut IndexGuard<'_>, protected: &[&str]) -> Vec<BackupMetadata> {
        if self.settings.max_backups == 0 {
            return Vec::new();
        }
        index.evict_oldest(self.settings.max_backups, protected)
    }

    /// Best-effort payload removal; leftovers show up as orphans in health checks
    fn remove_payloads(&self, evicted: &[BackupMetadata]) {
        for meta in evicted {
            match self.store.remove(&meta.payload_key()) {
                Ok(()) => info!(id = %meta.id, "retention removed backup"),
                Err(e) => warn!(id = %meta.id, error = %e, "failed to remove evicted payload"),
            }
        }
    }
}
