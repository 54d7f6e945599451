//! Duplicate detection CLI commands

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::backup::BackupManager;
use crate::config::Settings;
use crate::display::{format_duplicate_groups, format_matches, format_resolution_summary};
use crate::duplicates::{
    apply_resolutions, preview_merge, DuplicateDetector, Resolution, ResolutionDecision,
};
use crate::error::{JobsafeError, JobsafeResult};
use crate::migration::{import_applications, ImportOptions, MigrationFormat};
use crate::models::BackupType;

use super::migrate::FormatArg;

/// Tag on the snapshot taken before duplicates are resolved
pub const PRE_DEDUPE_TAG: &str = "pre-dedupe";

/// How `resolve` treats every group
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Fold each group into its primary record
    Merge,
    /// Leave every group untouched
    Skip,
    /// Treat each group as distinct applications
    KeepBoth,
    /// Keep only the most recently applied record of each group
    KeepNewest,
    /// Use the recommendation of each group
    Recommended,
}

impl StrategyArg {
    fn resolution(self) -> Option<Resolution> {
        match self {
            Self::Merge => Some(Resolution::Merge),
            Self::Skip => Some(Resolution::SkipDuplicates),
            Self::KeepBoth => Some(Resolution::KeepBoth),
            Self::KeepNewest => Some(Resolution::KeepNewest),
            Self::Recommended => None,
        }
    }
}

/// Duplicate subcommands
#[derive(Subcommand)]
pub enum DuplicatesCommands {
    /// Group duplicate applications in the current data
    Scan,

    /// Check the applications in a file against the current data
    Check {
        /// File holding one or more candidate applications
        file: PathBuf,

        /// File format (guessed from the extension if omitted)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Resolve every duplicate group in the current data
    Resolve {
        /// Resolution applied to all groups
        #[arg(short, long, value_enum, default_value = "recommended")]
        strategy: StrategyArg,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a duplicates command
pub fn handle_duplicates_command(
    manager: &BackupManager,
    settings: &Settings,
    cmd: DuplicatesCommands,
) -> JobsafeResult<()> {
    let detector = DuplicateDetector::new(settings.duplicates.clone());

    match cmd {
        DuplicatesCommands::Scan => {
            let applications = manager.load_applications()?;
            let groups = detector.find_groups(&applications);
            print!("{}", format_duplicate_groups(&groups, &applications));
            if !groups.is_empty() {
                println!();
                println!("Resolve them with: jobsafe duplicates resolve");
            }
        }

        DuplicatesCommands::Check { file, format } => {
            let format = match format {
                Some(format) => format.into(),
                None => MigrationFormat::from_path(&file)?,
            };
            let input = std::fs::read_to_string(&file).map_err(|e| {
                JobsafeError::Import(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let candidates = import_applications(
                &input,
                &ImportOptions {
                    format,
                    validate: false,
                },
            )?
            .applications;

            let existing = manager.load_applications()?;
            for candidate in &candidates {
                let matches = detector.find_matches(candidate, &existing, None);
                print!("{}", format_matches(candidate, &matches, &existing));
            }
        }

        DuplicatesCommands::Resolve { strategy, force } => {
            let applications = manager.load_applications()?;
            let groups = detector.find_groups(&applications);
            if groups.is_empty() {
                println!("No duplicates found.");
                return Ok(());
            }

            let decisions = match strategy.resolution() {
                Some(resolution) => ResolutionDecision::uniform(groups, resolution),
                None => ResolutionDecision::recommended(groups),
            };

            if !force {
                println!("Planned resolutions");
                println!("===================");
                for (n, decision) in decisions.iter().enumerate() {
                    println!(
                        "Group {}: {} ({})",
                        n + 1,
                        decision.resolution,
                        decision.group.ids.join(", ")
                    );
                    if decision.resolution == Resolution::Merge {
                        if let Some(preview) = preview_merge(&decision.group, &applications) {
                            for change in &preview.field_changes {
                                println!("    {}", change);
                            }
                        }
                    }
                }
                println!();
                let strategy_name = strategy
                    .to_possible_value()
                    .map(|value| value.get_name().to_string())
                    .unwrap_or_default();
                println!("To apply, run again with --force flag:");
                println!(
                    "  jobsafe duplicates resolve --strategy {} --force",
                    strategy_name
                );
                return Ok(());
            }

            let outcome = apply_resolutions(&applications, &decisions);
            if !outcome.summary.deleted_ids.is_empty() || outcome.applications != applications {
                let safety = manager.create_backup(
                    &applications,
                    "Pre-dedupe backup",
                    BackupType::Migration,
                    vec![PRE_DEDUPE_TAG.to_string()],
                )?;
                manager.save_applications(&outcome.applications)?;
                println!("Previous data saved as backup {}", safety.id);
            }
            print!("{}", format_resolution_summary(&outcome.summary));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_mapping() {
        assert_eq!(StrategyArg::Skip.resolution(), Some(Resolution::SkipDuplicates));
        assert_eq!(StrategyArg::KeepBoth.resolution(), Some(Resolution::KeepBoth));
        assert_eq!(StrategyArg::Recommended.resolution(), None);
    }
}
