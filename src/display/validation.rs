//! Validation and repair display formatting

use crate::validation::{RepairFix, ValidationReport};

pub fn format_validation_report(report: &ValidationReport, record_count: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Validated {} application(s): {}\n",
        record_count,
        report.summary()
    ));

    if !report.errors.is_empty() {
        output.push_str("\nErrors:\n");
        for issue in &report.errors {
            output.push_str(&format!("  {}\n", issue));
        }
    }

    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for issue in &report.warnings {
            output.push_str(&format!("  {}\n", issue));
        }
    }

    if !report.suggestions.is_empty() {
        output.push_str("\nSuggestions:\n");
        for suggestion in &report.suggestions {
            output.push_str(&format!(
                "  {} ({} record(s))\n",
                suggestion.description, suggestion.affected_records
            ));
        }
    }

    output.push_str(if report.is_valid() {
        "\nResult: valid\n"
    } else {
        "\nResult: INVALID\n"
    });
    output
}

/// One line per fix, grouped in the order the fixes were made
pub fn format_repair_fixes(fixes: &[RepairFix]) -> String {
    if fixes.is_empty() {
        return "Nothing to repair.\n".to_string();
    }

    let mut output = format!("{} fix(es):\n", fixes.len());
    for fix in fixes {
        output.push_str(&format!(
            "  record #{} {}: {}\n",
            fix.record_index + 1,
            fix.field,
            fix.description
        ));
    }
    output
}
