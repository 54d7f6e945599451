//! Configuration module for Jobsafe
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - Settings persistence (backup retention, duplicate thresholds, retries)

pub mod paths;
pub mod settings;

pub use paths::JobsafePaths;
pub use settings::{BackupSettings, Settings};
