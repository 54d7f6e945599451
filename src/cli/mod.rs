//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup manager and the
//! record-set operations.

pub mod auto_backup;
pub mod backup;
pub mod data;
pub mod duplicates;
pub mod migrate;

pub use auto_backup::{handle_auto_backup, AutoBackupArgs};
pub use backup::{handle_backup_command, BackupCommands};
pub use data::{handle_repair, handle_validate};
pub use duplicates::{handle_duplicates_command, DuplicatesCommands};
pub use migrate::{handle_export, handle_import, ExportArgs, ImportArgs};
