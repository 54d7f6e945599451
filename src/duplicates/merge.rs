//! Merging duplicate records into one
//!
//! Field-level preferences:
//! - text fields: the longest non-blank value, earlier records win ties
//! - status: the most advanced pipeline stage
//! - applied date: the earliest valid date (first contact)
//! - response and interview dates: the latest valid date
//! - tags and requirements: union without exact-string repeats
//! - notes: every distinct non-blank note, joined with a separator

use serde::Serialize;

use crate::diff::field_changes;
use crate::models::{parse_date, Application};

use super::detector::DuplicateGroup;

/// Separator placed between notes from different records
pub const NOTES_SEPARATOR: &str = "\n\n---\n\n";

/// What a merge would produce, without applying it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePreview {
    pub primary_id: String,
    pub merged: Application,
    /// Ids of the secondary records that would be deleted
    pub removed_ids: Vec<String>,
    /// Changes to the primary record
    pub field_changes: Vec<String>,
}

fn longest_text(values: &[&str]) -> String {
    let mut best = "";
    for value in values {
        let value = value.trim();
        if value.chars().count() > best.chars().count() {
            best = value;
        }
    }
    best.to_string()
}

fn longest_optional(values: &[Option<&str>]) -> Option<String> {
    let present: Vec<&str> = values.iter().flatten().copied().collect();
    let best = longest_text(&present);
    if best.is_empty() {
        None
    } else {
        Some(best)
    }
}

/// Pick the date value whose parsed date is preferred by `prefer`
fn pick_date<'a>(
    values: impl Iterator<Item = &'a str>,
    prefer: fn(chrono::NaiveDate, chrono::NaiveDate) -> bool,
) -> Option<&'a str> {
    let mut best: Option<(chrono::NaiveDate, &str)> = None;
    for value in values {
        if let Some(date) = parse_date(value) {
            let better = match best {
                Some((current, _)) => prefer(date, current),
                None => true,
            };
            if better {
                best = Some((date, value));
            }
        }
    }
    best.map(|(_, value)| value)
}

fn union_strings<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for list in lists {
        for item in list {
            if !merged.contains(item) {
                merged.push(item.clone());
            }
        }
    }
    merged
}

/// Merge a primary record with its duplicates
///
/// The primary's id is kept.
pub fn merge_applications(primary: &Application, others: &[&Application]) -> Application {
    let all: Vec<&Application> = std::iter::once(primary).chain(others.iter().copied()).collect();

    let text = |field: fn(&Application) -> &str| {
        longest_text(&all.iter().map(|a| field(a)).collect::<Vec<_>>())
    };
    let optional = |field: fn(&Application) -> Option<&str>| {
        longest_optional(&all.iter().map(|a| field(a)).collect::<Vec<_>>())
    };

    let status = all
        .iter()
        .map(|a| a.status)
        .fold(primary.status, |acc, s| acc.most_advanced(s));

    let applied_date = pick_date(all.iter().map(|a| a.applied_date.as_str()), |a, b| a < b)
        .map(str::to_string)
        .unwrap_or_else(|| primary.applied_date.clone());

    let response_date = pick_date(
        all.iter().filter_map(|a| a.response_date.as_deref()),
        |a, b| a > b,
    )
    .map(str::to_string)
    .or_else(|| primary.response_date.clone());

    let interview_date = pick_date(
        all.iter().filter_map(|a| a.interview_date.as_deref()),
        |a, b| a > b,
    )
    .map(str::to_string)
    .or_else(|| primary.interview_date.clone());

    let mut notes: Vec<&str> = Vec::new();
    for app in &all {
        let note = app.notes.trim();
        if !note.is_empty() && !notes.contains(&note) {
            notes.push(note);
        }
    }

    Application {
        id: primary.id.clone(),
        company: text(|a| &a.company),
        position: text(|a| &a.position),
        location: optional(|a| a.location.as_deref()),
        status,
        applied_date,
        response_date,
        interview_date,
        notes: notes.join(NOTES_SEPARATOR),
        job_description: text(|a| &a.job_description),
        salary: optional(|a| a.salary.as_deref()),
        tags: union_strings(all.iter().map(|a| &a.tags)),
        requirements: union_strings(all.iter().map(|a| &a.requirements)),
        contact_email: optional(|a| a.contact_email.as_deref()),
        contact_phone: optional(|a| a.contact_phone.as_deref()),
        job_url: optional(|a| a.job_url.as_deref()),
    }
}

/// Preview merging a duplicate group found in `applications`
///
/// Returns `None` if the group refers to records outside the list.
pub fn preview_merge(group: &DuplicateGroup, applications: &[Application]) -> Option<MergePreview> {
    let records: Vec<&Application> = group
        .indices
        .iter()
        .map(|&i| applications.get(i))
        .collect::<Option<_>>()?;
    let (primary, others) = records.split_first()?;

    let merged = merge_applications(primary, others);
    Some(MergePreview {
        primary_id: primary.id.clone(),
        field_changes: field_changes(primary, &merged),
        removed_ids: others.iter().map(|a| a.id.clone()).collect(),
        merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{MatchConfidence, Resolution};
    use crate::models::ApplicationStatus;

    fn app(id: &str) -> Application {
        Application {
            id: id.into(),
            company: "Acme".into(),
            position: "Dev".into(),
            applied_date: "2024-03-10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_longer_strings_win() {
        let mut a = app("a");
        let mut b = app("b");
        b.company = "Acme Corporation".into();
        a.location = Some("NYC".into());
        b.location = Some("New York, NY".into());
        a.job_description = "Build things".into();

        let merged = merge_applications(&a, &[&b]);
        assert_eq!(merged.id, "a");
        assert_eq!(merged.company, "Acme Corporation");
        assert_eq!(merged.location.as_deref(), Some("New York, NY"));
        assert_eq!(merged.job_description, "Build things");
    }

    #[test]
    fn test_status_only_advances() {
        let a = app("a").with_status(ApplicationStatus::Offered);
        let b = app("b").with_status(ApplicationStatus::Interviewing);
        assert_eq!(
            merge_applications(&a, &[&b]).status,
            ApplicationStatus::Offered
        );
        assert_eq!(
            merge_applications(&b, &[&a]).status,
            ApplicationStatus::Offered
        );
    }

    #[test]
    fn test_dates_first_contact_and_latest_response() {
        let mut a = app("a").with_applied_date("2024-03-10");
        let mut b = app("b").with_applied_date("2024-03-08");
        a.response_date = Some("2024-03-20".into());
        b.response_date = Some("2024-03-25".into());
        let c = app("c").with_applied_date("garbage");

        let merged = merge_applications(&a, &[&b, &c]);
        assert_eq!(merged.applied_date, "2024-03-08");
        assert_eq!(merged.response_date.as_deref(), Some("2024-03-25"));
    }

    #[test]
    fn test_lists_union_and_notes_concatenate() {
        let mut a = app("a");
        let mut b = app("b");
        a.tags = vec!["remote".into(), "rust".into()];
        b.tags = vec!["rust".into(), "Rust".into()];
        a.notes = "Referred by Sam".into();
        b.notes = "Recruiter called".into();
        let mut c = app("c");
        c.notes = "Referred by Sam".into();

        let merged = merge_applications(&a, &[&b, &c]);
        assert_eq!(merged.tags, vec!["remote", "rust", "Rust"]);
        assert_eq!(
            merged.notes,
            format!("Referred by Sam{}Recruiter called", NOTES_SEPARATOR)
        );
    }

    #[test]
    fn test_preview_merge() {
        let a = app("a");
        let mut b = app("b");
        b.salary = Some("$150k".into());
        let apps = vec![a, b];
        let group = DuplicateGroup {
            indices: vec![0, 1],
            ids: vec!["a".into(), "b".into()],
            confidence: 0.95,
            level: MatchConfidence::High,
            reasons: vec![],
            recommended: Resolution::Merge,
        };

        let preview = preview_merge(&group, &apps).unwrap();
        assert_eq!(preview.primary_id, "a");
        assert_eq!(preview.removed_ids, vec!["b"]);
        assert_eq!(preview.merged.salary.as_deref(), Some("$150k"));
        assert_eq!(preview.field_changes, vec!["salary: (added) -> \"$150k\""]);
        assert_eq!(apps.len(), 2);
    }

    #[test]
    fn test_preview_out_of_range() {
        let group = DuplicateGroup {
            indices: vec![0, 5],
            ids: vec![],
            confidence: 0.9,
            level: MatchConfidence::High,
            reasons: vec![],
            recommended: Resolution::Merge,
        };
        assert!(preview_merge(&group, &[app("a")]).is_none());
    }
}
