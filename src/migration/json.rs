//! JSON migration documents
//!
//! A document is an object with an `applications` array and an optional
//! `metadata` object. Import also accepts a bare array of records.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::Application;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Describes an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,

    /// Version of the tool that wrote the export
    pub version: String,

    #[serde(default)]
    pub schema_version: String,

    pub application_count: usize,
}

impl ExportMetadata {
    pub fn for_records(applications: &[Application]) -> Self {
        Self {
            exported_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            application_count: applications.len(),
        }
    }
}

/// Structured-text migration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationDocument {
    pub applications: Vec<Application>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExportMetadata>,
}

impl MigrationDocument {
    pub fn new(applications: &[Application], include_metadata: bool) -> Self {
        Self {
            metadata: include_metadata.then(|| ExportMetadata::for_records(applications)),
            applications: applications.to_vec(),
        }
    }

    /// Interpret an already-parsed value as a document or a bare array
    pub fn from_value(value: Value) -> JobsafeResult<Self> {
        match value {
            Value::Array(_) => {
                let applications = serde_json::from_value(value)
                    .map_err(|e| JobsafeError::Import(format!("Invalid application record: {}", e)))?;
                Ok(Self {
                    applications,
                    metadata: None,
                })
            }
            Value::Object(ref object) if object.contains_key("applications") => {
                serde_json::from_value(value)
                    .map_err(|e| JobsafeError::Import(format!("Invalid migration document: {}", e)))
            }
            _ => Err(JobsafeError::Import(
                "Expected an object with an 'applications' array, or an array of applications"
                    .into(),
            )),
        }
    }
}

/// Write records as a pretty-printed JSON document
pub fn export_json<W: Write>(
    applications: &[Application],
    include_metadata: bool,
    writer: &mut W,
) -> JobsafeResult<()> {
    let document = MigrationDocument::new(applications, include_metadata);
    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|e| JobsafeError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| JobsafeError::Export(e.to_string()))?;
    Ok(())
}

/// Parse a JSON document or bare array
pub fn import_json(input: &str) -> JobsafeResult<MigrationDocument> {
    if input.trim().is_empty() {
        return Err(JobsafeError::Import("Input is empty".into()));
    }
    let value: Value = serde_json::from_str(input)
        .map_err(|e| JobsafeError::Import(format!("Malformed JSON: {}", e)))?;
    MigrationDocument::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationStatus;

    fn records() -> Vec<Application> {
        vec![
            Application {
                id: "app-1".into(),
                company: "Acme, Inc.".into(),
                position: "Engineer".into(),
                applied_date: "2024-02-01".into(),
                notes: "Said \"call back\"\nnext week".into(),
                tags: vec!["rust".into()],
                ..Default::default()
            },
            Application {
                id: "app-2".into(),
                company: "Globex".into(),
                position: "SRE".into(),
                status: ApplicationStatus::Offered,
                applied_date: "2024-02-03".into(),
                salary: Some("$140k".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_round_trip() {
        let mut out = Vec::new();
        export_json(&records(), true, &mut out).unwrap();

        let document = import_json(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(document.applications, records());

        let metadata = document.metadata.unwrap();
        assert_eq!(metadata.application_count, 2);
        assert_eq!(metadata.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_metadata_field_names() {
        let mut out = Vec::new();
        export_json(&[], true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"exportedAt\""));
        assert!(text.contains("\"applicationCount\": 0"));
    }

    #[test]
    fn test_without_metadata() {
        let mut out = Vec::new();
        export_json(&records(), false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("metadata"));
    }

    #[test]
    fn test_bare_array() {
        let document =
            import_json(r#"[{"id": "x", "company": "Acme", "position": "Dev"}]"#).unwrap();
        assert_eq!(document.applications.len(), 1);
        assert_eq!(document.applications[0].status, ApplicationStatus::Applied);
        assert!(document.metadata.is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(import_json("").is_err());
        assert!(import_json("{not json").is_err());
        assert!(import_json(r#"{"records": []}"#).is_err());
        assert!(import_json("42").is_err());
    }
}
