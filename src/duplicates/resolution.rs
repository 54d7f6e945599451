//! Applying user decisions to duplicate groups
//!
//! Each processed group is counted exactly once as merged, skipped or kept,
//! and each deleted record is reported by exactly one group.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Application;

use super::detector::DuplicateGroup;
use super::merge::merge_applications;

/// How to resolve a duplicate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Fold secondaries into the primary, delete the secondaries
    Merge,
    /// Leave the data untouched
    SkipDuplicates,
    /// Leave the data untouched; the records are distinct applications
    KeepBoth,
    /// Keep only the record with the latest applied date
    KeepNewest,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::SkipDuplicates => write!(f, "skip_duplicates"),
            Self::KeepBoth => write!(f, "keep_both"),
            Self::KeepNewest => write!(f, "keep_newest"),
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "merge" => Ok(Self::Merge),
            "skip" | "skip_duplicates" => Ok(Self::SkipDuplicates),
            "keep_both" => Ok(Self::KeepBoth),
            "keep_newest" | "newest" => Ok(Self::KeepNewest),
            other => Err(format!("Unknown resolution: {}", other)),
        }
    }
}

/// A group together with the resolution chosen for it
#[derive(Debug, Clone)]
pub struct ResolutionDecision {
    pub group: DuplicateGroup,
    pub resolution: Resolution,
}

impl ResolutionDecision {
    /// Accept the detector's recommendation for every group
    pub fn recommended(groups: Vec<DuplicateGroup>) -> Vec<Self> {
        groups
            .into_iter()
            .map(|group| Self {
                resolution: group.recommended,
                group,
            })
            .collect()
    }

    /// Apply the same resolution to every group
    pub fn uniform(groups: Vec<DuplicateGroup>, resolution: Resolution) -> Vec<Self> {
        groups
            .into_iter()
            .map(|group| Self { group, resolution })
            .collect()
    }
}

/// What happened to one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOutcome {
    pub group_index: usize,
    pub resolution: Resolution,
    /// Surviving record, when the group was merged or pruned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept_id: Option<String>,
    pub deleted_ids: Vec<String>,
}

/// Totals across all processed groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub groups_processed: usize,
    pub merged: usize,
    pub skipped: usize,
    pub kept: usize,
    pub deleted_ids: Vec<String>,
    pub outcomes: Vec<GroupOutcome>,
}

impl ResolutionSummary {
    /// Every group is accounted for exactly once
    pub fn is_consistent(&self) -> bool {
        self.merged + self.skipped + self.kept == self.groups_processed
    }
}

/// Resolved record set plus the summary of what changed
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub applications: Vec<Application>,
    pub summary: ResolutionSummary,
}

/// Apply resolutions to the record set the groups were detected in
///
/// Records deleted by an earlier group are ignored by later ones; a group
/// left with fewer than two live records is counted as skipped.
pub fn apply_resolutions(
    applications: &[Application],
    decisions: &[ResolutionDecision],
) -> ResolutionOutcome {
    let mut deleted: HashSet<usize> = HashSet::new();
    let mut updated: HashMap<usize, Application> = HashMap::new();
    let mut reported: HashSet<String> = HashSet::new();
    let mut summary = ResolutionSummary::default();

    for (group_index, decision) in decisions.iter().enumerate() {
        summary.groups_processed += 1;

        let mut live: Vec<usize> = Vec::new();
        for &index in &decision.group.indices {
            if index < applications.len() && !deleted.contains(&index) && !live.contains(&index) {
                live.push(index);
            }
        }

        let current = |index: usize, updated: &HashMap<usize, Application>| {
            updated
                .get(&index)
                .cloned()
                .unwrap_or_else(|| applications[index].clone())
        };

        let mut outcome = GroupOutcome {
            group_index,
            resolution: decision.resolution,
            kept_id: None,
            deleted_ids: Vec::new(),
        };

        let (keep, remove) = match decision.resolution {
            _ if live.len() < 2 => (None, Vec::new()),
            Resolution::SkipDuplicates | Resolution::KeepBoth => (None, Vec::new()),
            Resolution::Merge => {
                let primary = current(live[0], &updated);
                let others: Vec<Application> =
                    live[1..].iter().map(|&i| current(i, &updated)).collect();
                let other_refs: Vec<&Application> = others.iter().collect();
                updated.insert(live[0], merge_applications(&primary, &other_refs));
                (Some(live[0]), live[1..].to_vec())
            }
            Resolution::KeepNewest => {
                let newest = newest_index(&live, |i| current(i, &updated));
                let remove = live.iter().copied().filter(|&i| i != newest).collect();
                (Some(newest), remove)
            }
        };

        match keep {
            None => summary.skipped += 1,
            Some(index) => {
                if decision.resolution == Resolution::Merge {
                    summary.merged += 1;
                } else {
                    summary.kept += 1;
                }
                outcome.kept_id = Some(current(index, &updated).id);
            }
        }

        for index in remove {
            deleted.insert(index);
            let id = applications[index].id.clone();
            if reported.insert(id.clone()) {
                outcome.deleted_ids.push(id.clone());
                summary.deleted_ids.push(id);
            }
        }

        summary.outcomes.push(outcome);
    }

    let applications: Vec<Application> = applications
        .iter()
        .enumerate()
        .filter(|(index, _)| !deleted.contains(index))
        .map(|(index, app)| updated.remove(&index).unwrap_or_else(|| app.clone()))
        .collect();

    info!(
        groups = summary.groups_processed,
        merged = summary.merged,
        skipped = summary.skipped,
        kept = summary.kept,
        deleted = summary.deleted_ids.len(),
        "applied duplicate resolutions"
    );

    ResolutionOutcome {
        applications,
        summary,
    }
}

/// Index of the record with the latest applied date
///
/// Unparseable dates sort oldest; ties keep the earlier record.
fn newest_index(live: &[usize], record: impl Fn(usize) -> Application) -> usize {
    let mut best = live[0];
    let mut best_date = record(best).applied_on();
    for &index in &live[1..] {
        let date = record(index).applied_on();
        if date > best_date {
            best = index;
            best_date = date;
        }
    }
    best
}
