//! Backup statistics and health scans
//!
//! Both are read-only. A damaged snapshot is reported against its id and
//! the scan moves on.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::{BackupMetadata, BackupType};
use crate::storage::{BACKUP_INDEX_KEY, BACKUP_KEY_PREFIX};
use crate::validation::validate_applications;

use super::manager::BackupManager;

/// Aggregate figures derived from the index alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStats {
    pub total_backups: usize,
    pub total_size_bytes: u64,
    pub average_size_bytes: u64,
    pub manual: usize,
    pub automatic: usize,
    pub migration: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// State of one snapshot after re-reading it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BackupHealth {
    Healthy,
    /// Index entry present, payload key absent
    MissingPayload,
    /// Checksum mismatch or undecodable payload
    Corrupted(String),
    /// Payload intact but its records have critical validation errors
    Invalid(String),
    /// The store failed while reading the payload
    Unreadable(String),
}

impl BackupHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCheck {
    pub id: String,
    pub version: String,
    pub health: BackupHealth,
}

/// Result of a full health scan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub checks: Vec<BackupCheck>,
    /// Payload keys with no index entry
    pub orphaned_payloads: Vec<String>,
    /// Seconds since the newest snapshot was taken
    pub newest_backup_age_secs: Option<i64>,
}

impl HealthReport {
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn healthy_count(&self) -> usize {
        self.checks.iter().filter(|c| c.health.is_healthy()).count()
    }

    pub fn unhealthy(&self) -> impl Iterator<Item = &BackupCheck> {
        self.checks.iter().filter(|c| !c.health.is_healthy())
    }

    /// Every snapshot verified and nothing orphaned
    pub fn is_healthy(&self) -> bool {
        self.healthy_count() == self.total() && self.orphaned_payloads.is_empty()
    }
}

impl BackupManager {
    /// Totals, sizes and per-type counts from the index
    pub fn backup_stats(&self) -> JobsafeResult<BackupStats> {
        let entries = self.list_backups()?;
        Ok(stats_for(&entries))
    }

    /// Re-verify every snapshot and look for orphaned payloads
    pub fn health_check(&self) -> JobsafeResult<HealthReport> {
        let entries = self.list_backups()?;
        let keys: HashSet<String> = self.store().keys()?.into_iter().collect();

        let mut report = HealthReport {
            newest_backup_age_secs: entries
                .first()
                .map(|newest| (Utc::now() - newest.created_at).num_seconds()),
            ..HealthReport::default()
        };

        for meta in &entries {
            let health = if keys.contains(&meta.payload_key()) {
                self.check_one(meta)
            } else {
                BackupHealth::MissingPayload
            };
            if !health.is_healthy() {
                warn!(id = %meta.id, health = ?health, "unhealthy backup");
            }
            report.checks.push(BackupCheck {
                id: meta.id.clone(),
                version: meta.version.clone(),
                health,
            });
        }

        let indexed: HashSet<String> = entries.iter().map(BackupMetadata::payload_key).collect();
        let mut orphans: Vec<String> = keys
            .into_iter()
            .filter(|key| {
                key.starts_with(BACKUP_KEY_PREFIX)
                    && key != BACKUP_INDEX_KEY
                    && !indexed.contains(key)
            })
            .collect();
        orphans.sort();
        report.orphaned_payloads = orphans;

        Ok(report)
    }

    fn check_one(&self, meta: &BackupMetadata) -> BackupHealth {
        match self.read_snapshot(meta) {
            Ok(snapshot) => {
                let validation = validate_applications(&snapshot.applications);
                if validation.is_valid() {
                    BackupHealth::Healthy
                } else {
                    BackupHealth::Invalid(validation.summary())
                }
            }
            Err(JobsafeError::Corrupted { reason, .. }) => BackupHealth::Corrupted(reason),
            Err(e) => BackupHealth::Unreadable(e.to_string()),
        }
    }
}

fn stats_for(entries: &[BackupMetadata]) -> BackupStats {
    let mut stats = BackupStats {
        total_backups: entries.len(),
        ..BackupStats::default()
    };

    for meta in entries {
        stats.total_size_bytes += meta.size_bytes;
        match meta.backup_type {
            BackupType::Manual => stats.manual += 1,
            BackupType::Automatic => stats.automatic += 1,
            BackupType::Migration => stats.migration += 1,
        }
        stats.oldest = Some(stats.oldest.map_or(meta.created_at, |t| t.min(meta.created_at)));
        stats.newest = Some(stats.newest.map_or(meta.created_at, |t| t.max(meta.created_at)));
    }

    if !entries.is_empty() {
        stats.average_size_bytes = stats.total_size_bytes / entries.len() as u64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::manager::tests::{manager_with, sample_apps};
    use crate::models::Application;
    use crate::storage::KeyValueStore;

    #[test]
    fn test_stats() {
        let (manager, _store) = manager_with(10);
        assert_eq!(manager.backup_stats().unwrap(), BackupStats::default());

        let a = manager
            .create_backup(&sample_apps(), "a", BackupType::Manual, vec![])
            .unwrap();
        let b = manager
            .create_backup(&[], "b", BackupType::Automatic, vec![])
            .unwrap();

        let stats = manager.backup_stats().unwrap();
        assert_eq!(stats.total_backups, 2);
        assert_eq!(stats.manual, 1);
        assert_eq!(stats.automatic, 1);
        assert_eq!(stats.total_size_bytes, a.size_bytes + b.size_bytes);
        assert_eq!(stats.oldest, Some(a.created_at));
        assert_eq!(stats.newest, Some(b.created_at));
    }

    #[test]
    fn test_health_reports_each_problem_by_id() {
        let (manager, store) = manager_with(10);
        let good = manager
            .create_backup(&sample_apps(), "good", BackupType::Manual, vec![])
            .unwrap();
        let tampered = manager
            .create_backup(&sample_apps(), "tampered", BackupType::Manual, vec![])
            .unwrap();
        let missing = manager
            .create_backup(&sample_apps(), "missing", BackupType::Manual, vec![])
            .unwrap();
        let invalid = manager
            .create_backup(
                &[Application {
                    id: "x".into(),
                    ..Default::default()
                }],
                "invalid",
                BackupType::Manual,
                vec![],
            )
            .unwrap();

        store.set(&tampered.payload_key(), b"{}").unwrap();
        store.remove(&missing.payload_key()).unwrap();
        store.set("backup_stray", b"{}").unwrap();

        let report = manager.health_check().unwrap();
        let health_of = |id: &str| {
            report
                .checks
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.health.clone())
                .unwrap()
        };

        assert_eq!(report.total(), 4);
        assert_eq!(report.healthy_count(), 1);
        assert_eq!(health_of(&good.id), BackupHealth::Healthy);
        assert!(matches!(health_of(&tampered.id), BackupHealth::Corrupted(_)));
        assert_eq!(health_of(&missing.id), BackupHealth::MissingPayload);
        assert!(matches!(health_of(&invalid.id), BackupHealth::Invalid(_)));
        assert_eq!(report.orphaned_payloads, vec!["backup_stray"]);
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_health_check_is_read_only() {
        let (manager, _store) = manager_with(10);
        manager
            .create_backup(&sample_apps(), "a", BackupType::Manual, vec![])
            .unwrap();

        let before = manager.list_backups().unwrap();
        let report = manager.health_check().unwrap();
        let after = manager.list_backups().unwrap();

        assert_eq!(before, after);
        assert_eq!(report.total(), after.len());
        assert!(report.is_healthy());
        assert!(report.newest_backup_age_secs.unwrap() >= 0);
    }
}
