//! Backup CLI commands
//!
//! Implements CLI commands for snapshot management.

use clap::Subcommand;

use crate::backup::{BackupManager, VersionRef};
use crate::display::{
    format_backup_details, format_backup_list, format_backup_stats, format_health_report,
    format_record_diff,
};
use crate::error::{JobsafeError, JobsafeResult};
use crate::models::{BackupMetadata, BackupType};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot the current applications
    Create {
        /// Description stored with the backup
        #[arg(short, long, default_value = "Manual backup")]
        description: String,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List all available backups, newest first
    List,

    /// Show information about a specific backup
    Info {
        /// Backup id (use 'latest' for most recent)
        backup: String,
    },

    /// Replace the current applications with a backup
    Restore {
        /// Backup id (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Roll back to an earlier version
    Rollback {
        /// Backup id of the version to roll back to
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup id
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Compare two versions ('current' is the live data)
    Compare {
        /// Older side
        from: String,

        /// Newer side
        #[arg(default_value = "current")]
        to: String,
    },

    /// Verify every backup and look for orphaned payloads
    Health,

    /// Show totals across all backups
    Stats,

    /// Delete backups beyond the retention limit
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(manager: &BackupManager, cmd: BackupCommands) -> JobsafeResult<()> {
    match cmd {
        BackupCommands::Create { description, tags } => {
            println!("Creating backup...");
            let metadata =
                manager.create_backup_of_current(&description, BackupType::Manual, tags)?;
            println!("Backup created: {}", metadata.id);
            println!("Version: {}", metadata.version);
            for change in &metadata.changes {
                println!("  - {}", change);
            }
        }

        BackupCommands::List => {
            let backups = manager.list_backups()?;
            println!("{}", format_backup_list(&backups));
            if backups.is_empty() {
                println!("Create one with: jobsafe backup create");
            }
        }

        BackupCommands::Info { backup } => {
            let metadata = resolve_backup(manager, &backup)?;
            print!("{}", format_backup_details(&metadata));
        }

        BackupCommands::Restore { backup, force } => {
            let metadata = resolve_backup(manager, &backup)?;
            print!("{}", format_backup_details(&metadata));
            println!();

            if !force {
                println!("WARNING: This will overwrite ALL current applications!");
                println!("A backup of the current data is taken first.");
                println!("To proceed, run again with --force flag:");
                println!("  jobsafe backup restore {} --force", backup);
                return Ok(());
            }

            println!("Restoring from backup...");
            let result = manager.restore_backup(&metadata.id)?;
            println!("Restore complete!");
            println!("{}", result.summary());
        }

        BackupCommands::Rollback { backup, force } => {
            let metadata = resolve_backup(manager, &backup)?;

            if !force {
                println!(
                    "This will roll the current applications back to version {} ({} application(s)).",
                    metadata.version, metadata.application_count
                );
                println!("To proceed, run again with --force flag:");
                println!("  jobsafe backup rollback {} --force", backup);
                return Ok(());
            }

            let result = manager.rollback_to_version(&metadata.id)?;
            println!("Rolled back to version {}", metadata.version);
            println!("{}", result.summary());
        }

        BackupCommands::Delete { backup, force } => {
            let metadata = resolve_backup(manager, &backup)?;

            if !force {
                println!(
                    "This will permanently delete backup {} ({}).",
                    metadata.id, metadata.description
                );
                println!("To proceed, run again with --force flag:");
                println!("  jobsafe backup delete {} --force", metadata.id);
                return Ok(());
            }

            if manager.delete_backup(&metadata.id)? {
                println!("Deleted backup {}", metadata.id);
            } else {
                println!("Backup {} was already gone", metadata.id);
            }
        }

        BackupCommands::Compare { from, to } => {
            let from = resolve_version(manager, &from)?;
            let to = resolve_version(manager, &to)?;
            println!("Comparing {} -> {}", from, to);
            println!();
            let diff = manager.compare_versions(&from, &to)?;
            print!("{}", format_record_diff(&diff));
        }

        BackupCommands::Health => {
            let report = manager.health_check()?;
            print!("{}", format_health_report(&report));
        }

        BackupCommands::Stats => {
            let stats = manager.backup_stats()?;
            print!("{}", format_backup_stats(&stats));
        }

        BackupCommands::Prune { force } => {
            let max = manager.settings().max_backups;
            let count = manager.list_backups()?.len();

            if max == 0 || count <= max {
                println!("No backups to prune.");
                println!(
                    "Current retention limit: {}",
                    if max == 0 {
                        "unlimited".to_string()
                    } else {
                        max.to_string()
                    }
                );
                println!("You have {} backup(s).", count);
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!("Retention limit: {}", max);
            println!("Current backups: {}", count);
            println!("To be deleted:   {}", count - max);
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  jobsafe backup prune --force");
                return Ok(());
            }

            let evicted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", evicted.len());
        }
    }

    Ok(())
}

/// Resolve a backup argument, accepting 'latest'
fn resolve_backup(manager: &BackupManager, backup: &str) -> JobsafeResult<BackupMetadata> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .latest_backup()?
            .ok_or_else(|| JobsafeError::backup_not_found("latest"));
    }
    manager.get_backup(backup)
}

fn resolve_version(manager: &BackupManager, arg: &str) -> JobsafeResult<VersionRef> {
    match arg.parse::<VersionRef>() {
        Ok(VersionRef::Backup(id)) => Ok(VersionRef::Backup(resolve_backup(manager, &id)?.id)),
        Ok(current) => Ok(current),
        Err(never) => match never {},
    }
}
