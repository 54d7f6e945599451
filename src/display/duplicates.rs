//! Duplicate display formatting

use crate::duplicates::{DuplicateGroup, DuplicateMatch, ResolutionSummary};
use crate::models::Application;

use super::truncate;

fn describe(app: Option<&Application>) -> String {
    match app {
        Some(app) => format!(
            "{} ({}, applied {})",
            truncate(&app.label(), 50),
            if app.id.is_empty() { "no id" } else { app.id.as_str() },
            if app.applied_date.is_empty() {
                "?"
            } else {
                app.applied_date.as_str()
            }
        ),
        None => "<missing record>".to_string(),
    }
}

/// Groups with their members, primary first
pub fn format_duplicate_groups(groups: &[DuplicateGroup], applications: &[Application]) -> String {
    if groups.is_empty() {
        return "No duplicates found.\n".to_string();
    }

    let mut output = format!("{} duplicate group(s)\n", groups.len());
    for (n, group) in groups.iter().enumerate() {
        output.push_str(&format!(
            "\nGroup {}: {} confidence ({:.0}%), recommended: {}\n",
            n + 1,
            group.level,
            group.confidence * 100.0,
            group.recommended
        ));
        for (position, &index) in group.indices.iter().enumerate() {
            let marker = if position == 0 { "*" } else { " " };
            output.push_str(&format!(
                "  {} {}\n",
                marker,
                describe(applications.get(index))
            ));
        }
        if !group.reasons.is_empty() {
            output.push_str(&format!("    {}\n", group.reasons.join("; ")));
        }
    }
    output
}

/// Matches for a single candidate, best first
pub fn format_matches(
    candidate: &Application,
    matches: &[DuplicateMatch],
    existing: &[Application],
) -> String {
    if matches.is_empty() {
        return format!("No existing application matches {}.\n", candidate.label());
    }

    let mut output = format!(
        "{} possible duplicate(s) of {}:\n",
        matches.len(),
        candidate.label()
    );
    for m in matches {
        output.push_str(&format!(
            "  {:>3.0}% {:<6} {}\n",
            m.score * 100.0,
            m.confidence.to_string(),
            describe(existing.get(m.index))
        ));
        if !m.reasons.is_empty() {
            output.push_str(&format!("         {}\n", m.reasons.join("; ")));
        }
    }
    output
}

pub fn format_resolution_summary(summary: &ResolutionSummary) -> String {
    let mut output = format!(
        "Processed {} group(s): {} merged, {} skipped, {} kept\n",
        summary.groups_processed, summary.merged, summary.skipped, summary.kept
    );
    if !summary.deleted_ids.is_empty() {
        output.push_str(&format!(
            "Deleted {} record(s): {}\n",
            summary.deleted_ids.len(),
            summary.deleted_ids.join(", ")
        ));
    }
    output
}
