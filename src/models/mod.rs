//! Core data models for Jobsafe
//!
//! This module contains the data structures under management: application
//! records, their pipeline status, and backup snapshots.

pub mod application;
pub mod backup;
pub mod status;

pub use application::{parse_date, today, Application};
pub use backup::{payload_key, BackupMetadata, BackupSnapshot, BackupType};
pub use status::ApplicationStatus;
