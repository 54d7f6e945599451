//! Backup snapshot model
//!
//! A snapshot bundles the full record set with ambient preferences and the
//! metadata describing it. Snapshots are never mutated once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::application::Application;

/// Why a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    /// Requested explicitly by the user
    #[default]
    Manual,
    /// Taken by the scheduler
    Automatic,
    /// Taken around an import, restore or rollback
    Migration,
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Automatic => write!(f, "automatic"),
            Self::Migration => write!(f, "migration"),
        }
    }
}

impl FromStr for BackupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automatic" | "auto" => Ok(Self::Automatic),
            "migration" => Ok(Self::Migration),
            other => Err(format!("Unknown backup type: {}", other)),
        }
    }
}

/// Index entry describing one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// Opaque, time-ordered id; the payload lives under `backup_<id>`
    pub id: String,

    pub created_at: DateTime<Utc>,

    /// Version tag distinguishing this snapshot
    pub version: String,

    pub description: String,

    /// Byte size of the serialized payload
    #[serde(default)]
    pub size_bytes: u64,

    /// Self-describing digest of the serialized payload
    #[serde(default)]
    pub checksum: String,

    #[serde(rename = "type")]
    pub backup_type: BackupType,

    pub application_count: usize,

    /// Version tag of the snapshot that was newest when this one was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<String>,

    /// Human-readable change summary against the parent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl BackupMetadata {
    /// Store key holding this snapshot's payload
    pub fn payload_key(&self) -> String {
        payload_key(&self.id)
    }

    /// Copy of this metadata as embedded in the payload itself
    ///
    /// Size and checksum describe the payload bytes, so they cannot be part
    /// of them.
    pub fn without_integrity(&self) -> Self {
        Self {
            size_bytes: 0,
            checksum: String::new(),
            ..self.clone()
        }
    }
}

/// Store key for a snapshot payload
pub fn payload_key(backup_id: &str) -> String {
    format!("backup_{}", backup_id)
}

/// Full snapshot contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub metadata: BackupMetadata,

    pub applications: Vec<Application>,

    /// User preferences blob, if one was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,

    /// Application settings blob, if one was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}
