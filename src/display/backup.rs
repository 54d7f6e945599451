//! Backup display formatting

use chrono::Utc;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::{BackupHealth, BackupStats, HealthReport};
use crate::diff::RecordSetDiff;
use crate::models::BackupMetadata;

use super::{format_duration, format_size, truncate};

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Apps")]
    applications: usize,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Table of backups, in the order given
pub fn format_backup_list(backups: &[BackupMetadata]) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let now = Utc::now();
    let rows = backups.iter().enumerate().map(|(i, meta)| BackupRow {
        position: i + 1,
        id: meta.id.clone(),
        kind: meta.backup_type.to_string(),
        age: format_duration(now.signed_duration_since(meta.created_at)),
        applications: meta.application_count,
        size: format_size(meta.size_bytes),
        description: truncate(&meta.description, 40),
    });

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push_str(&format!("\n\nTotal: {} backup(s)", backups.len()));
    output
}

/// Full metadata of one backup
pub fn format_backup_details(meta: &BackupMetadata) -> String {
    let mut output = String::new();
    output.push_str(&format!("Backup:       {}\n", meta.id));
    output.push_str(&format!("Version:      {}\n", meta.version));
    output.push_str(&format!(
        "Created:      {}\n",
        meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Type:         {}\n", meta.backup_type));
    output.push_str(&format!("Description:  {}\n", meta.description));
    output.push_str(&format!("Applications: {}\n", meta.application_count));
    output.push_str(&format!("Size:         {}\n", format_size(meta.size_bytes)));
    output.push_str(&format!("Checksum:     {}\n", meta.checksum));
    if let Some(parent) = &meta.parent_version {
        output.push_str(&format!("Parent:       {}\n", parent));
    }
    if !meta.tags.is_empty() {
        output.push_str(&format!("Tags:         {}\n", meta.tags.join(", ")));
    }
    if !meta.changes.is_empty() {
        output.push_str("Changes:\n");
        for change in &meta.changes {
            output.push_str(&format!("  - {}\n", change));
        }
    }
    output
}

pub fn format_backup_stats(stats: &BackupStats) -> String {
    let mut output = String::new();
    output.push_str(&format!("Backups:      {}\n", stats.total_backups));
    output.push_str(&format!(
        "  manual {}, automatic {}, migration {}\n",
        stats.manual, stats.automatic, stats.migration
    ));
    output.push_str(&format!(
        "Total size:   {}\n",
        format_size(stats.total_size_bytes)
    ));
    output.push_str(&format!(
        "Average size: {}\n",
        format_size(stats.average_size_bytes)
    ));
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        output.push_str(&format!(
            "Oldest:       {}\n",
            oldest.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "Newest:       {}\n",
            newest.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    output
}

fn health_label(health: &BackupHealth) -> String {
    match health {
        BackupHealth::Healthy => "ok".to_string(),
        BackupHealth::MissingPayload => "payload missing".to_string(),
        BackupHealth::Corrupted(reason) => format!("corrupted: {}", reason),
        BackupHealth::Invalid(summary) => format!("invalid: {}", summary),
        BackupHealth::Unreadable(error) => format!("unreadable: {}", error),
    }
}

pub fn format_health_report(report: &HealthReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} of {} backup(s) healthy\n",
        report.healthy_count(),
        report.total()
    ));

    if let Some(age) = report.newest_backup_age_secs {
        output.push_str(&format!(
            "Newest backup is {} old\n",
            format_duration(chrono::Duration::seconds(age))
        ));
    }

    let problems: Vec<_> = report.unhealthy().collect();
    if !problems.is_empty() {
        output.push_str("\nProblems:\n");
        for check in problems {
            output.push_str(&format!("  {}  {}\n", check.id, health_label(&check.health)));
        }
    }

    if !report.orphaned_payloads.is_empty() {
        output.push_str("\nOrphaned payloads (no index entry):\n");
        for key in &report.orphaned_payloads {
            output.push_str(&format!("  {}\n", key));
        }
    }

    output.push_str(if report.is_healthy() {
        "\nStatus: healthy\n"
    } else {
        "\nStatus: attention needed\n"
    });
    output
}

/// Summary lines followed by per-record details
pub fn format_record_diff(diff: &RecordSetDiff) -> String {
    let mut output = diff.summary_lines().join("\n");
    output.push('\n');

    for app in &diff.added {
        output.push_str(&format!("\n+ {} ({})", app.label(), app.id));
    }
    for app in &diff.removed {
        output.push_str(&format!("\n- {} ({})", app.label(), app.id));
    }
    for modified in &diff.modified {
        output.push_str(&format!("\n~ {} ({})", modified.after.label(), modified.id));
        for change in &modified.changes {
            output.push_str(&format!("\n    {}", change));
        }
    }

    if !diff.is_empty() {
        output.push('\n');
    }
    output
}
