//! Foreground runner for the automatic backup scheduler

use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use crate::backup::{AutoBackupScheduler, BackupManager};
use crate::error::{JobsafeError, JobsafeResult};

#[derive(Args, Debug)]
pub struct AutoBackupArgs {
    /// Seconds between checks (defaults to the configured interval)
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Stop after this many checks instead of running until interrupted
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Run even when automatic backups are disabled in settings
    #[arg(long)]
    pub force: bool,
}

pub fn handle_auto_backup(manager: Arc<BackupManager>, args: AutoBackupArgs) -> JobsafeResult<()> {
    if !manager.settings().auto_backup_enabled && !args.force {
        return Err(JobsafeError::Config(
            "automatic backups are disabled; set backup.auto_backup_enabled in settings or pass --force"
                .into(),
        ));
    }

    let interval_secs = args
        .interval_secs
        .unwrap_or(manager.settings().auto_backup_interval_secs);
    if interval_secs == 0 {
        return Err(JobsafeError::Config(
            "auto-backup interval must be at least one second".into(),
        ));
    }
    if args.ticks == Some(0) {
        println!("Nothing to do for zero ticks.");
        return Ok(());
    }

    match args.ticks {
        Some(ticks) => println!(
            "Checking for changes every {}s, {} time(s)",
            interval_secs, ticks
        ),
        None => println!(
            "Checking for changes every {}s; press Ctrl-C to stop",
            interval_secs
        ),
    }

    let scheduler =
        AutoBackupScheduler::start(manager, Duration::from_secs(interval_secs), args.ticks);
    let created = scheduler.wait();

    println!("Auto-backup finished: {} backup(s) created", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupSettings;
    use crate::storage::MemoryStore;

    fn manager(auto_backup_enabled: bool) -> Arc<BackupManager> {
        Arc::new(BackupManager::new(
            Arc::new(MemoryStore::new()),
            BackupSettings {
                auto_backup_enabled,
                ..BackupSettings::default()
            },
        ))
    }

    fn args(force: bool) -> AutoBackupArgs {
        AutoBackupArgs {
            interval_secs: Some(1),
            ticks: Some(0),
            force,
        }
    }

    #[test]
    fn test_disabled_setting_refuses_without_force() {
        let err = handle_auto_backup(manager(false), args(false)).unwrap_err();
        assert!(matches!(err, JobsafeError::Config(_)));
    }

    #[test]
    fn test_force_or_enabled_setting_runs() {
        assert!(handle_auto_backup(manager(false), args(true)).is_ok());
        assert!(handle_auto_backup(manager(true), args(false)).is_ok());
    }
}
