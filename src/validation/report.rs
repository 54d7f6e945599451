//! Validation report types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    InvalidFormat,
    MissingOptionalField,
    DuplicateId,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "missing_field"),
            Self::InvalidFormat => write!(f, "invalid_format"),
            Self::MissingOptionalField => write!(f, "missing_optional_field"),
            Self::DuplicateId => write!(f, "duplicate_id"),
        }
    }
}

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks storing, restoring or strict export
    Critical,
    /// Advisory only
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    /// Position of the record in the validated list
    pub record_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationIssue {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] record #{}", self.kind, self.record_index + 1)?;
        if let Some(id) = &self.record_id {
            write!(f, " ({})", id)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Corrective action offered alongside a failing report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Run the repair engine over the whole set
    AutoFix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSuggestion {
    pub action: RepairAction,
    pub description: String,
    /// Number of records the action would touch
    pub affected_records: usize,
}

/// Errors, warnings and repair suggestions for one record set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggestions: Vec<RepairSuggestion>,
}

impl ValidationReport {
    /// A set is valid iff it has no critical errors
    pub fn is_valid(&self) -> bool {
        self.critical_count() == 0
    }

    pub fn critical_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_critical()).count()
    }

    /// Critical errors only
    pub fn critical_errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(|e| e.is_critical())
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return "No issues found".to_string();
        }

        let mut parts = Vec::new();
        let critical = self.critical_count();
        if critical > 0 {
            parts.push(format!("{} critical error(s)", critical));
        }
        let minor = self.errors.len() - critical;
        if minor > 0 {
            parts.push(format!("{} minor error(s)", minor));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("{} warning(s)", self.warnings.len()));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: IssueKind, severity: Severity) -> ValidationIssue {
        ValidationIssue {
            kind,
            severity,
            message: "test".into(),
            record_index: 0,
            record_id: Some("a1".into()),
            field: None,
        }
    }

    #[test]
    fn test_valid_ignores_non_critical() {
        let report = ValidationReport {
            errors: vec![issue(IssueKind::InvalidFormat, Severity::Warning)],
            warnings: vec![issue(IssueKind::MissingOptionalField, Severity::Warning)],
            suggestions: vec![],
        };
        assert!(report.is_valid());
        assert_eq!(report.summary(), "1 minor error(s), 1 warning(s)");
    }

    #[test]
    fn test_critical_blocks() {
        let report = ValidationReport {
            errors: vec![issue(IssueKind::DuplicateId, Severity::Critical)],
            ..Default::default()
        };
        assert!(!report.is_valid());
        assert_eq!(report.critical_count(), 1);
        assert_eq!(report.summary(), "1 critical error(s)");
    }

    #[test]
    fn test_issue_display() {
        let text = issue(IssueKind::MissingField, Severity::Critical).to_string();
        assert_eq!(text, "[missing_field] record #1 (a1): test");
    }
}
