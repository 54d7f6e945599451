//! YAML migration documents
//!
//! Same document shape as JSON, for people who want to read or hand-edit
//! an export.

use std::io::Write;

use serde_json::Value;

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::Application;

use super::json::MigrationDocument;

/// Write records as a YAML document with a short header comment
pub fn export_yaml<W: Write>(
    applications: &[Application],
    include_metadata: bool,
    writer: &mut W,
) -> JobsafeResult<()> {
    let document = MigrationDocument::new(applications, include_metadata);

    writeln!(writer, "# Jobsafe application export")
        .map_err(|e| JobsafeError::Export(e.to_string()))?;
    writeln!(writer, "# {} application(s)", applications.len())
        .map_err(|e| JobsafeError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| JobsafeError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &document).map_err(|e| JobsafeError::Export(e.to_string()))?;

    Ok(())
}

/// Parse a YAML document or bare sequence
pub fn import_yaml(input: &str) -> JobsafeResult<MigrationDocument> {
    if input.trim().is_empty() {
        return Err(JobsafeError::Import("Input is empty".into()));
    }
    let value: Value = serde_yaml::from_str(input)
        .map_err(|e| JobsafeError::Import(format!("Malformed YAML: {}", e)))?;
    MigrationDocument::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationStatus;

    #[test]
    fn test_round_trip() {
        let records = vec![Application {
            id: "app-1".into(),
            company: "Acme: Widgets".into(),
            position: "Dev".into(),
            status: ApplicationStatus::Interviewing,
            applied_date: "2024-02-01".into(),
            requirements: vec!["Rust".into(), "- SQL".into()],
            ..Default::default()
        }];

        let mut out = Vec::new();
        export_yaml(&records, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# Jobsafe application export"));

        let document = import_yaml(&text).unwrap();
        assert_eq!(document.applications, records);
        assert_eq!(document.metadata.unwrap().application_count, 1);
    }

    #[test]
    fn test_bare_sequence() {
        let document = import_yaml("- id: a\n  company: Acme\n  position: Dev\n").unwrap();
        assert_eq!(document.applications[0].company, "Acme");
    }

    #[test]
    fn test_empty_input() {
        assert!(import_yaml("  \n").is_err());
    }
}
