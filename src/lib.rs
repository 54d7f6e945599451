//! Jobsafe - data integrity for job-application records
//!
//! This library keeps a job-search tracker's record set safe: it validates
//! and repairs records, detects and resolves duplicates, takes versioned
//! checksummed snapshots with restore and rollback, and moves records in
//! and out of JSON, CSV and YAML.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Application records and backup metadata
//! - `storage`: Key-value store abstraction with file and memory backends
//! - `integrity`: Content checksums and version tags
//! - `validation`: Validation reports and the repair engine
//! - `duplicates`: Similarity scoring, grouping, merge and resolution
//! - `diff`: Record-set and field-level comparison
//! - `backup`: Snapshot store, retention, restore, health and scheduling
//! - `migration`: Import/export codecs
//! - `cli` / `display`: The `jobsafe` binary's commands and output
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jobsafe::backup::BackupManager;
//! use jobsafe::config::{JobsafePaths, Settings};
//! use jobsafe::storage::FileStore;
//!
//! let paths = JobsafePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = Arc::new(FileStore::open(paths.data_dir())?);
//! let manager = BackupManager::new(store, settings.backup.clone());
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod diff;
pub mod display;
pub mod duplicates;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod models;
pub mod storage;
pub mod validation;

pub use error::{JobsafeError, JobsafeResult};
