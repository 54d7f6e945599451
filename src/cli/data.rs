//! Validation and repair CLI commands

use crate::backup::BackupManager;
use crate::display::{format_repair_fixes, format_validation_report};
use crate::error::{JobsafeError, JobsafeResult};
use crate::models::BackupType;
use crate::validation::{repair_applications, validate_applications};

/// Tag on the snapshot taken before repairs are written
pub const PRE_REPAIR_TAG: &str = "pre-repair";

/// Validate the current applications
///
/// Returns `ValidationFailed` when there are critical errors so the
/// process exits non-zero.
pub fn handle_validate(manager: &BackupManager) -> JobsafeResult<()> {
    let applications = manager.load_applications()?;
    let report = validate_applications(&applications);
    print!("{}", format_validation_report(&report, applications.len()));

    if report.is_valid() {
        Ok(())
    } else {
        Err(JobsafeError::ValidationFailed {
            critical: report.critical_count(),
            summary: report.summary(),
        })
    }
}

/// Repair the current applications, writing them back with `apply`
pub fn handle_repair(manager: &BackupManager, apply: bool) -> JobsafeResult<()> {
    let applications = manager.load_applications()?;
    let repair = repair_applications(applications.clone());
    print!("{}", format_repair_fixes(&repair.fixes));

    if !repair.changed() {
        return Ok(());
    }

    if !apply {
        println!();
        println!("Nothing was written. To save the repaired applications, run:");
        println!("  jobsafe repair --apply");
        return Ok(());
    }

    let safety = manager.create_backup(
        &applications,
        "Pre-repair backup",
        BackupType::Migration,
        vec![PRE_REPAIR_TAG.to_string()],
    )?;
    manager.save_applications(&repair.applications)?;

    println!();
    println!(
        "Saved {} repaired application(s); previous data is in backup {}",
        repair.applications.len(),
        safety.id
    );
    Ok(())
}
