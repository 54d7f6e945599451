//! Diffs between records and record sets
//!
//! Record-level diffs compare the JSON form of two applications field by
//! field and render human-readable change lines. Set-level diffs match
//! records by id.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::Application;

/// Field-by-field changes between two versions of a record
///
/// Returns lines such as `status: "applied" -> "interviewing"`; changed and
/// removed fields come first, then fields only present in `after`.
pub fn field_changes(before: &Application, after: &Application) -> Vec<String> {
    let before = serde_json::to_value(before).unwrap_or(Value::Null);
    let after = serde_json::to_value(after).unwrap_or(Value::Null);
    value_changes(&before, &after)
}

/// Changes between two JSON values, one line per top-level field
pub fn value_changes(before: &Value, after: &Value) -> Vec<String> {
    let mut changes = Vec::new();

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    Some(_) => {}
                    None => changes.push(format!(
                        "{}: {} -> (removed)",
                        key,
                        format_value(before_val)
                    )),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }
        }
        _ => {
            if before != after {
                changes.push(format!(
                    "{} -> {}",
                    format_value(before),
                    format_value(after)
                ));
            }
        }
    }

    changes
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

/// A record present in both sets whose contents differ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedRecord {
    pub id: String,
    pub before: Application,
    pub after: Application,
    pub changes: Vec<String>,
}

/// Set difference by id between an older and a newer record set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSetDiff {
    pub added: Vec<Application>,
    pub removed: Vec<Application>,
    pub modified: Vec<ModifiedRecord>,
}

impl RecordSetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Human-readable change summary lines
    pub fn summary_lines(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["No changes".to_string()];
        }

        let mut lines = Vec::new();
        if !self.added.is_empty() {
            lines.push(format!("Added {} application(s)", self.added.len()));
        }
        if !self.removed.is_empty() {
            lines.push(format!("Removed {} application(s)", self.removed.len()));
        }
        if !self.modified.is_empty() {
            lines.push(format!("Modified {} application(s)", self.modified.len()));
        }
        lines
    }
}

/// Compare two record sets by id
///
/// A record present in both with a different serialized form is modified.
/// When an id occurs more than once in a set, the first occurrences are
/// compared; repeats beyond the other set's count for that id are added
/// or removed.
pub fn diff_record_sets(old: &[Application], new: &[Application]) -> RecordSetDiff {
    let old_by_id = first_by_id(old);
    let new_by_id = first_by_id(new);
    let old_counts = id_counts(old);
    let new_counts = id_counts(new);

    let mut diff = RecordSetDiff::default();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for app in new {
        let occurrence = seen.entry(app.id.as_str()).or_insert(0);
        if *occurrence >= old_counts.get(app.id.as_str()).copied().unwrap_or(0) {
            diff.added.push(app.clone());
        }
        *occurrence += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (position, app) in old.iter().enumerate() {
        let occurrence = seen.entry(app.id.as_str()).or_insert(0);
        let repeat = *occurrence;
        *occurrence += 1;

        if old_by_id.get(app.id.as_str()).map(|(p, _)| *p) != Some(position) {
            if repeat >= new_counts.get(app.id.as_str()).copied().unwrap_or(0) {
                diff.removed.push(app.clone());
            }
            continue;
        }
        match new_by_id.get(app.id.as_str()) {
            None => diff.removed.push(app.clone()),
            Some((_, after)) => {
                if serialized(app) != serialized(after) {
                    diff.modified.push(ModifiedRecord {
                        id: app.id.clone(),
                        before: app.clone(),
                        after: (*after).clone(),
                        changes: field_changes(app, after),
                    });
                }
            }
        }
    }

    diff
}

fn first_by_id(apps: &[Application]) -> HashMap<&str, (usize, &Application)> {
    let mut map = HashMap::new();
    for (position, app) in apps.iter().enumerate() {
        map.entry(app.id.as_str()).or_insert((position, app));
    }
    map
}

fn id_counts(apps: &[Application]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for app in apps {
        *counts.entry(app.id.as_str()).or_insert(0) += 1;
    }
    counts
}

fn serialized(app: &Application) -> String {
    serde_json::to_string(app).unwrap_or_default()
}
