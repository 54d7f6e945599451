//! Backup and version store for Jobsafe
//!
//! Snapshots of the record set are kept in the key-value store with a
//! content checksum and an opaque version tag, and can be listed, restored,
//! rolled back to, compared and health-checked.
//!
//! # Architecture
//!
//! - `VersionIndex`: the `backup_metadata` index; all mutation goes through
//!   one critical section
//! - `BackupManager`: create, load, delete, retention, restore, rollback,
//!   compare, statistics and health scans
//! - `AutoBackupScheduler`: recurring automatic snapshots
//!
//! # Storage layout
//!
//! - `backup_<id>`: the serialized snapshot, byte-for-byte what the
//!   checksum covers
//! - `backup_metadata`: JSON array of index entries in creation order
//!
//! # Retention
//!
//! After each snapshot the oldest ones beyond `max_backups` (default 10)
//! are deleted.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jobsafe::backup::BackupManager;
//! use jobsafe::config::BackupSettings;
//! use jobsafe::models::BackupType;
//! use jobsafe::storage::MemoryStore;
//!
//! let manager = BackupManager::new(Arc::new(MemoryStore::new()), BackupSettings::default());
//! let meta = manager.create_backup_of_current("Before cleanup", BackupType::Manual, vec![])?;
//!
//! // Later, undo whatever happened since
//! let result = manager.rollback_to_version(&meta.id)?;
//! println!("{}", result.summary());
//! ```

mod compare;
mod health;
mod index;
mod manager;
mod restore;
mod scheduler;

pub use compare::VersionRef;
pub use health::{BackupCheck, BackupHealth, BackupStats, HealthReport};
pub use index::{IndexGuard, VersionIndex};
pub use manager::BackupManager;
pub use restore::{RestoreResult, PRE_RESTORE_TAG};
pub use scheduler::{AutoBackupScheduler, TickOutcome, AUTO_BACKUP_DESCRIPTION};
