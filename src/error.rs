//! Custom error types for Jobsafe
//!
//! This module defines the error hierarchy for the library using thiserror.
//! Validation and repair never produce these for recoverable issues; they
//! return structured reports instead. Errors here are reserved for missing
//! snapshots, corrupted payloads, unsupported formats and store failures.

use thiserror::Error;

/// The main error type for Jobsafe operations
#[derive(Error, Debug)]
pub enum JobsafeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key-value store itself failed (read, write, remove)
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Critical validation errors block a strict operation
    #[error("Validation failed with {critical} critical error(s): {summary}")]
    ValidationFailed { critical: usize, summary: String },

    /// Snapshot payload exists but cannot be trusted
    #[error("Backup {backup_id} is corrupted: {reason}")]
    Corrupted { backup_id: String, reason: String },

    /// Codec asked for a format it does not implement
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors that are not transient (bad keys, bad layout)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl JobsafeError {
    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create a corruption error for a backup
    pub fn corrupted(backup_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            backup_id: backup_id.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }

    /// Check if this is a corruption error
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }

    /// Whether retrying the same store operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for JobsafeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for JobsafeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for JobsafeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Json(format!("YAML: {}", err))
    }
}

impl From<csv::Error> for JobsafeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Result type alias for Jobsafe operations
pub type JobsafeResult<T> = Result<T, JobsafeError>;
