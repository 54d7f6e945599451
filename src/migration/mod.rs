//! Migration codec for Jobsafe
//!
//! Converts record sets to and from interchange formats:
//! - JSON: `{ "applications": [...], "metadata": {...} }` or a bare array
//! - YAML: the same document shape
//! - CSV: one header row of field names, one row per record
//!
//! Export can refuse to write a set with critical validation errors.
//! Import validates by default and repairs a failing set instead of
//! rejecting it.

pub mod csv;
pub mod json;
pub mod yaml;

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::Application;
use crate::validation::{repair_applications, validate_applications, RepairFix, ValidationReport};

pub use self::csv::{export_csv, import_csv};
pub use json::{export_json, import_json, ExportMetadata, MigrationDocument, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_yaml, import_yaml};

/// Interchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationFormat {
    #[default]
    Json,
    Csv,
    Yaml,
}

impl MigrationFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> JobsafeResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                JobsafeError::UnsupportedFormat(format!(
                    "cannot infer format of {} without an extension",
                    path.display()
                ))
            })?;
        extension.parse()
    }
}

impl fmt::Display for MigrationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for MigrationFormat {
    type Err = JobsafeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(JobsafeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Options for [`export_applications`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: MigrationFormat,
    /// Add export metadata (structured formats only)
    pub include_metadata: bool,
    /// Refuse to export a set with critical validation errors
    pub validate: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: MigrationFormat::Json,
            include_metadata: true,
            validate: false,
        }
    }
}

/// Options for [`import_applications`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub format: MigrationFormat,
    /// Validate the parsed set and repair it if it fails
    pub validate: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            format: MigrationFormat::Json,
            validate: true,
        }
    }
}

/// Records produced by an import
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub applications: Vec<Application>,
    /// Validation of the records as parsed, when requested
    pub validation: Option<ValidationReport>,
    /// Whether the parsed records had to be repaired
    pub repaired: bool,
    pub fixes: Vec<RepairFix>,
}

/// Write `applications` in the requested format
///
/// # Errors
///
/// With `validate` set, `ValidationFailed` if the set has critical errors;
/// nothing is written in that case.
pub fn export_applications<W: Write>(
    applications: &[Application],
    options: &ExportOptions,
    writer: &mut W,
) -> JobsafeResult<()> {
    if options.validate {
        let report = validate_applications(applications);
        if !report.is_valid() {
            return Err(JobsafeError::ValidationFailed {
                critical: report.critical_count(),
                summary: report.summary(),
            });
        }
    }

    match options.format {
        MigrationFormat::Json => export_json(applications, options.include_metadata, writer)?,
        MigrationFormat::Yaml => export_yaml(applications, options.include_metadata, writer)?,
        MigrationFormat::Csv => export_csv(applications, writer)?,
    }

    info!(
        format = %options.format,
        applications = applications.len(),
        "exported applications"
    );
    Ok(())
}

/// Parse records from `input` in the requested format
///
/// With `validate` set, a set with critical errors is repaired before it
/// is returned rather than rejected.
pub fn import_applications(input: &str, options: &ImportOptions) -> JobsafeResult<ImportOutcome> {
    let applications = match options.format {
        MigrationFormat::Json => import_json(input)?.applications,
        MigrationFormat::Yaml => import_yaml(input)?.applications,
        MigrationFormat::Csv => import_csv(input)?,
    };

    let mut outcome = ImportOutcome {
        applications,
        validation: None,
        repaired: false,
        fixes: Vec::new(),
    };

    if options.validate {
        let report = validate_applications(&outcome.applications);
        if !report.is_valid() {
            warn!(
                critical = report.critical_count(),
                "imported records failed validation, repairing"
            );
            let repair = repair_applications(std::mem::take(&mut outcome.applications));
            outcome.applications = repair.applications;
            outcome.fixes = repair.fixes;
            outcome.repaired = true;
        }
        outcome.validation = Some(report);
    }

    info!(
        format = %options.format,
        applications = outcome.applications.len(),
        repaired = outcome.repaired,
        "imported applications"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Application> {
        vec![
            Application {
                id: "app-1".into(),
                company: "Acme".into(),
                position: "Dev".into(),
                applied_date: "2024-01-10".into(),
                ..Default::default()
            },
            Application {
                id: "app-2".into(),
                company: "Globex".into(),
                position: "Ops".into(),
                applied_date: "2024-01-12".into(),
                ..Default::default()
            },
        ]
    }

    fn export_to_string(apps: &[Application], options: ExportOptions) -> JobsafeResult<String> {
        let mut out = Vec::new();
        export_applications(apps, &options, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("YML".parse::<MigrationFormat>().unwrap(), MigrationFormat::Yaml);
        assert!(matches!(
            "xml".parse::<MigrationFormat>(),
            Err(JobsafeError::UnsupportedFormat(_))
        ));
        assert_eq!(
            MigrationFormat::from_path(Path::new("out/apps.csv")).unwrap(),
            MigrationFormat::Csv
        );
        assert!(MigrationFormat::from_path(Path::new("apps")).is_err());
    }

    #[test]
    fn test_structured_round_trip_without_validation() {
        for format in [MigrationFormat::Json, MigrationFormat::Yaml] {
            let text = export_to_string(
                &records(),
                ExportOptions {
                    format,
                    ..ExportOptions::default()
                },
            )
            .unwrap();
            let outcome = import_applications(
                &text,
                &ImportOptions {
                    format,
                    validate: false,
                },
            )
            .unwrap();
            assert_eq!(outcome.applications, records());
            assert!(outcome.validation.is_none());
        }
    }

    #[test]
    fn test_validated_export_refuses_invalid_set() {
        let mut apps = records();
        apps[1].company.clear();

        let mut out = Vec::new();
        let err = export_applications(
            &apps,
            &ExportOptions {
                validate: true,
                ..ExportOptions::default()
            },
            &mut out,
        )
        .unwrap_err();

        assert!(err.is_validation());
        assert!(out.is_empty());
    }

    #[test]
    fn test_import_repairs_invalid_set() {
        let input = "id,company,position,appliedDate\n\
                     ,Google,SWE,2024-01-01\n\
                     ,Google,SWE,not a date\n";
        let outcome = import_applications(
            input,
            &ImportOptions {
                format: MigrationFormat::Csv,
                validate: true,
            },
        )
        .unwrap();

        assert!(outcome.repaired);
        assert!(!outcome.fixes.is_empty());
        assert!(!outcome.validation.unwrap().is_valid());
        assert!(validate_applications(&outcome.applications).is_valid());
        assert_ne!(outcome.applications[0].id, outcome.applications[1].id);
    }

    #[test]
    fn test_import_valid_set_untouched() {
        let text = export_to_string(&records(), ExportOptions::default()).unwrap();
        let outcome = import_applications(&text, &ImportOptions::default()).unwrap();
        assert!(!outcome.repaired);
        assert!(outcome.validation.unwrap().is_valid());
        assert_eq!(outcome.applications, records());
    }
}
