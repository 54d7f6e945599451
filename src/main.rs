use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobsafe::backup::BackupManager;
use jobsafe::cli::{
    handle_auto_backup, handle_backup_command, handle_duplicates_command, handle_export,
    handle_import, handle_repair, handle_validate, AutoBackupArgs, BackupCommands,
    DuplicatesCommands, ExportArgs, ImportArgs,
};
use jobsafe::config::{JobsafePaths, Settings};
use jobsafe::storage::{FileStore, KeyValueStore, RetryingStore};

/// Environment variable holding the log filter
const LOG_ENV: &str = "JOBSAFE_LOG";

#[derive(Parser)]
#[command(
    name = "jobsafe",
    author = "Kaylee Beyene",
    version,
    about = "Backups, validation and deduplication for job-application records",
    long_about = "Jobsafe keeps a job-search record set safe: versioned, checksummed \
                  backups with restore and rollback, validation and repair, duplicate \
                  detection, and import/export in JSON, CSV and YAML."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Validate the current applications
    Validate,

    /// Repair the current applications
    Repair {
        /// Write the repaired applications back
        #[arg(long)]
        apply: bool,
    },

    /// Duplicate detection commands
    #[command(subcommand, alias = "dupes")]
    Duplicates(DuplicatesCommands),

    /// Export the current applications
    Export(ExportArgs),

    /// Import applications from a file
    Import(ImportArgs),

    /// Run the automatic backup scheduler in the foreground
    AutoBackup(AutoBackupArgs),

    /// Show current configuration and paths
    Config,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Initialize paths and settings
    let paths = JobsafePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("Jobsafe - data integrity for job-application records");
        println!();
        println!("Run 'jobsafe --help' for usage information.");
        println!("Run 'jobsafe import <file>' to load applications.");
        return Ok(());
    };

    // Storage is only opened by commands that touch it
    let manager = || open_manager(&paths, &settings);

    match command {
        Commands::Backup(cmd) => handle_backup_command(&*manager()?, cmd)?,
        Commands::Validate => handle_validate(&*manager()?)?,
        Commands::Repair { apply } => handle_repair(&*manager()?, apply)?,
        Commands::Duplicates(cmd) => handle_duplicates_command(&*manager()?, &settings, cmd)?,
        Commands::Export(args) => handle_export(&*manager()?, args)?,
        Commands::Import(args) => handle_import(&*manager()?, args)?,
        Commands::AutoBackup(args) => handle_auto_backup(manager()?, args)?,
        Commands::Config => print_config(&paths, &settings),
    }

    Ok(())
}

fn open_manager(paths: &JobsafePaths, settings: &Settings) -> Result<Arc<BackupManager>> {
    paths.ensure_directories()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(RetryingStore::new(
        FileStore::open(paths.data_dir())?,
        settings.store_retry,
    ));
    Ok(Arc::new(BackupManager::new(store, settings.backup.clone())))
}

fn print_config(paths: &JobsafePaths, settings: &Settings) {
    println!("Jobsafe Configuration");
    println!("=====================");
    println!("Base directory: {}", paths.base_dir().display());
    println!("Data directory: {}", paths.data_dir().display());
    println!("Settings file:  {}", paths.settings_file().display());
    println!();
    println!("Settings:");
    println!("  Max backups:          {}", settings.backup.max_backups);
    println!(
        "  Auto-backup:          {} (every {}s)",
        if settings.backup.auto_backup_enabled {
            "enabled"
        } else {
            "disabled"
        },
        settings.backup.auto_backup_interval_secs
    );
    println!("  Hash algorithm:       {}", settings.backup.hash_algorithm);
    println!(
        "  Duplicate thresholds: report {:.2}, high {:.2}, date window {}d",
        settings.duplicates.report_threshold,
        settings.duplicates.high_threshold,
        settings.duplicates.date_window_days
    );
    println!(
        "  Store retry:          {} attempt(s), {}ms backoff",
        settings.store_retry.attempts, settings.store_retry.backoff_ms
    );
}
