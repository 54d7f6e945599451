//! Rule-based validation of application record sets
//!
//! Every rule runs over every record; findings accumulate without
//! short-circuiting.

use std::collections::{BTreeSet, HashSet};

use crate::models::{parse_date, Application};

use super::report::{
    IssueKind, RepairAction, RepairSuggestion, Severity, ValidationIssue, ValidationReport,
};

/// Validate a record set
pub fn validate_applications(applications: &[Application]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, app) in applications.iter().enumerate() {
        check_required(&mut report, index, app);
        check_dates(&mut report, index, app);
        check_optional(&mut report, index, app);
    }

    check_duplicate_ids(&mut report, applications);

    if !report.errors.is_empty() {
        let affected: BTreeSet<usize> = report.errors.iter().map(|e| e.record_index).collect();
        report.suggestions.push(RepairSuggestion {
            action: RepairAction::AutoFix,
            description: format!(
                "Automatically repair {} error(s): assign missing or duplicate ids, \
                 fill blank company/position, reset invalid applied dates",
                report.errors.len()
            ),
            affected_records: affected.len(),
        });
    }

    report
}

fn record_id(app: &Application) -> Option<String> {
    let id = app.id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn error(
    report: &mut ValidationReport,
    kind: IssueKind,
    severity: Severity,
    index: usize,
    app: &Application,
    field: &str,
    message: String,
) {
    report.errors.push(ValidationIssue {
        kind,
        severity,
        message,
        record_index: index,
        record_id: record_id(app),
        field: Some(field.to_string()),
    });
}

fn warning(
    report: &mut ValidationReport,
    kind: IssueKind,
    index: usize,
    app: &Application,
    field: &str,
    message: String,
) {
    report.warnings.push(ValidationIssue {
        kind,
        severity: Severity::Warning,
        message,
        record_index: index,
        record_id: record_id(app),
        field: Some(field.to_string()),
    });
}

fn check_required(report: &mut ValidationReport, index: usize, app: &Application) {
    if app.id.trim().is_empty() {
        error(
            report,
            IssueKind::MissingField,
            Severity::Critical,
            index,
            app,
            "id",
            "Application is missing an id".to_string(),
        );
    }

    if app.company.trim().is_empty() {
        error(
            report,
            IssueKind::MissingField,
            Severity::Critical,
            index,
            app,
            "company",
            "Company name is required".to_string(),
        );
    }

    if app.position.trim().is_empty() {
        error(
            report,
            IssueKind::MissingField,
            Severity::Critical,
            index,
            app,
            "position",
            "Position title is required".to_string(),
        );
    }
}

fn check_dates(report: &mut ValidationReport, index: usize, app: &Application) {
    if app.applied_date.trim().is_empty() {
        error(
            report,
            IssueKind::MissingField,
            Severity::Critical,
            index,
            app,
            "appliedDate",
            "Applied date is required".to_string(),
        );
    } else if parse_date(&app.applied_date).is_none() {
        error(
            report,
            IssueKind::InvalidFormat,
            Severity::Critical,
            index,
            app,
            "appliedDate",
            format!("Applied date '{}' is not a valid date", app.applied_date),
        );
    }

    let optional_dates = [
        ("responseDate", &app.response_date),
        ("interviewDate", &app.interview_date),
    ];
    for (field, value) in optional_dates {
        if let Some(value) = value {
            if !value.trim().is_empty() && parse_date(value).is_none() {
                error(
                    report,
                    IssueKind::InvalidFormat,
                    Severity::Warning,
                    index,
                    app,
                    field,
                    format!("{} '{}' is not a valid date", field, value),
                );
            }
        }
    }
}

fn check_optional(report: &mut ValidationReport, index: usize, app: &Application) {
    let has_location = app
        .location
        .as_deref()
        .map_or(false, |l| !l.trim().is_empty());
    if !has_location {
        warning(
            report,
            IssueKind::MissingOptionalField,
            index,
            app,
            "location",
            "Location is not set".to_string(),
        );
    }

    if let Some(email) = app.contact_email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            warning(
                report,
                IssueKind::InvalidFormat,
                index,
                app,
                "contactEmail",
                format!("Contact email '{}' looks malformed", email),
            );
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn check_duplicate_ids(report: &mut ValidationReport, applications: &[Application]) {
    let mut seen = HashSet::new();

    for (index, app) in applications.iter().enumerate() {
        let id = app.id.trim();
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id) {
            error(
                report,
                IssueKind::DuplicateId,
                Severity::Critical,
                index,
                app,
                "id",
                format!("Duplicate application id '{}'", id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str, company: &str, position: &str) -> Application {
        Application {
            id: id.into(),
            company: company.into(),
            position: position.into(),
            location: Some("Remote".into()),
            applied_date: "2024-05-01".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_set() {
        let report = validate_applications(&[app("a", "Acme", "Dev"), app("b", "Beta", "QA")]);
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_empty_set_is_valid() {
        assert!(validate_applications(&[]).is_valid());
    }

    #[test]
    fn test_missing_required_fields() {
        let report = validate_applications(&[app("", "  ", "")]);
        let fields: Vec<_> = report
            .errors
            .iter()
            .map(|e| (e.kind, e.field.clone().unwrap()))
            .collect();
        assert_eq!(
            fields,
            vec![
                (IssueKind::MissingField, "id".to_string()),
                (IssueKind::MissingField, "company".to_string()),
                (IssueKind::MissingField, "position".to_string()),
            ]
        );
        assert_eq!(report.critical_count(), 3);
    }

    #[test]
    fn test_invalid_applied_date() {
        let mut record = app("a", "Acme", "Dev");
        record.applied_date = "last tuesday".into();
        let report = validate_applications(&[record]);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, IssueKind::InvalidFormat);
        assert_eq!(report.errors[0].field.as_deref(), Some("appliedDate"));
        assert!(report.errors[0].is_critical());
    }

    #[test]
    fn test_invalid_response_date_is_not_critical() {
        let mut record = app("a", "Acme", "Dev");
        record.response_date = Some("soon".into());
        let report = validate_applications(&[record]);

        assert_eq!(report.errors.len(), 1);
        assert!(!report.errors[0].is_critical());
        assert!(report.is_valid());
    }

    #[test]
    fn test_missing_location_warns() {
        let mut record = app("a", "Acme", "Dev");
        record.location = None;
        let report = validate_applications(&[record]);

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::MissingOptionalField);
    }

    #[test]
    fn test_duplicate_ids_flag_later_occurrences_only() {
        let report = validate_applications(&[
            app("x", "A", "P"),
            app("y", "B", "P"),
            app("x", "C", "P"),
            app("x", "D", "P"),
        ]);

        let dupes: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.kind == IssueKind::DuplicateId)
            .map(|e| e.record_index)
            .collect();
        assert_eq!(dupes, vec![2, 3]);
    }

    #[test]
    fn test_single_auto_fix_suggestion() {
        let report = validate_applications(&[app("", "", ""), app("", "", "")]);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].action, RepairAction::AutoFix);
        assert_eq!(report.suggestions[0].affected_records, 2);
    }

    #[test]
    fn test_malformed_email_warns() {
        let mut record = app("a", "Acme", "Dev");
        record.contact_email = Some("recruiter-at-acme".into());
        let report = validate_applications(&[record]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::InvalidFormat);
    }
}
