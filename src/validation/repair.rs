//! Deterministic repair of invalid record sets
//!
//! Repair fills or replaces invalid fields and never drops a record. Steps
//! run in a fixed order:
//!
//! 1. records without an id get a fresh one
//! 2. duplicate ids: the first record to claim an id keeps it, later ones
//!    are reassigned
//! 3. blank company/position get placeholder text
//! 4. missing or unparseable applied dates become today

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{parse_date, today, Application};

/// Placeholder for a blank company name
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Placeholder for a blank position title
pub const UNKNOWN_POSITION: &str = "Unknown Position";

/// One change made by the repair engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairFix {
    pub record_index: usize,
    pub field: &'static str,
    pub description: String,
}

/// Repaired records and the fixes applied to them
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    pub applications: Vec<Application>,
    pub fixes: Vec<RepairFix>,
}

impl RepairReport {
    /// Whether anything had to change
    pub fn changed(&self) -> bool {
        !self.fixes.is_empty()
    }
}

/// Repair a record set so that it validates without critical errors
pub fn repair_applications(applications: Vec<Application>) -> RepairReport {
    let mut applications = applications;
    let mut fixes = Vec::new();

    for (index, app) in applications.iter_mut().enumerate() {
        if app.id.trim().is_empty() {
            app.id = Application::generate_id();
            fixes.push(RepairFix {
                record_index: index,
                field: "id",
                description: format!("Assigned new id {}", app.id),
            });
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    for (index, app) in applications.iter_mut().enumerate() {
        if !seen.insert(app.id.trim().to_string()) {
            let previous = std::mem::replace(&mut app.id, Application::generate_id());
            seen.insert(app.id.clone());
            fixes.push(RepairFix {
                record_index: index,
                field: "id",
                description: format!("Replaced duplicate id {} with {}", previous, app.id),
            });
        }
    }

    for (index, app) in applications.iter_mut().enumerate() {
        if app.company.trim().is_empty() {
            app.company = UNKNOWN_COMPANY.to_string();
            fixes.push(RepairFix {
                record_index: index,
                field: "company",
                description: format!("Filled blank company with '{}'", UNKNOWN_COMPANY),
            });
        }
        if app.position.trim().is_empty() {
            app.position = UNKNOWN_POSITION.to_string();
            fixes.push(RepairFix {
                record_index: index,
                field: "position",
                description: format!("Filled blank position with '{}'", UNKNOWN_POSITION),
            });
        }
        if parse_date(&app.applied_date).is_none() {
            let previous = std::mem::replace(&mut app.applied_date, today());
            fixes.push(RepairFix {
                record_index: index,
                field: "appliedDate",
                description: if previous.trim().is_empty() {
                    format!("Set missing applied date to {}", app.applied_date)
                } else {
                    format!(
                        "Replaced invalid applied date '{}' with {}",
                        previous, app.applied_date
                    )
                },
            });
        }
    }

    RepairReport {
        applications,
        fixes,
    }
}
