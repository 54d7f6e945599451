//! Export and import CLI commands

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use crate::backup::BackupManager;
use crate::display::{format_repair_fixes, format_validation_report};
use crate::error::{JobsafeError, JobsafeResult};
use crate::migration::{
    export_applications, import_applications, ExportOptions, ImportOptions, MigrationFormat,
};
use crate::models::{Application, BackupType};

/// Tag on the snapshot taken before an import is written
pub const PRE_IMPORT_TAG: &str = "pre-import";

/// Interchange format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// JSON document with optional metadata
    Json,
    /// One row per application
    Csv,
    /// YAML document, human-readable
    Yaml,
}

impl From<FormatArg> for MigrationFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => MigrationFormat::Json,
            FormatArg::Csv => MigrationFormat::Csv,
            FormatArg::Yaml => MigrationFormat::Yaml,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave out the export metadata block
    #[arg(long)]
    pub no_metadata: bool,

    /// Refuse to export applications with critical validation errors
    #[arg(long)]
    pub validate: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// File to import
    pub file: PathBuf,

    /// Import format (guessed from the extension if omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Import the records as-is, without validation or repair
    #[arg(long)]
    pub no_validate: bool,

    /// Replace the current applications instead of merging by id
    #[arg(long)]
    pub replace: bool,
}

pub fn handle_export(manager: &BackupManager, args: ExportArgs) -> JobsafeResult<()> {
    let applications = manager.load_applications()?;
    let options = ExportOptions {
        format: args.format.into(),
        include_metadata: !args.no_metadata,
        validate: args.validate,
    };

    match &args.output {
        Some(path) => {
            // A refused export must not create the file
            let mut buffer = Vec::new();
            export_applications(&applications, &options, &mut buffer)?;

            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&buffer)?;
            writer.flush()?;

            println!(
                "Exported {} application(s) to {}",
                applications.len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            export_applications(&applications, &options, &mut handle)?;
            handle.flush()?;
        }
    }

    Ok(())
}

pub fn handle_import(manager: &BackupManager, args: ImportArgs) -> JobsafeResult<()> {
    let format = match args.format {
        Some(format) => format.into(),
        None => MigrationFormat::from_path(&args.file)?,
    };
    let input = read_input(&args.file)?;

    let outcome = import_applications(
        &input,
        &ImportOptions {
            format,
            validate: !args.no_validate,
        },
    )?;

    if let Some(report) = &outcome.validation {
        print!(
            "{}",
            format_validation_report(report, outcome.applications.len())
        );
    }
    if outcome.repaired {
        println!();
        println!("Imported data was repaired:");
        print!("{}", format_repair_fixes(&outcome.fixes));
    }

    let current = manager.load_applications()?;
    if !current.is_empty() {
        let safety = manager.create_backup(
            &current,
            &format!("Pre-import backup ({})", args.file.display()),
            BackupType::Migration,
            vec![PRE_IMPORT_TAG.to_string()],
        )?;
        println!("Current data saved as backup {}", safety.id);
    }

    let imported = outcome.applications.len();
    let combined = if args.replace {
        outcome.applications
    } else {
        merge_by_id(current, outcome.applications)
    };
    manager.save_applications(&combined)?;

    println!(
        "Imported {} application(s) from {} ({}); {} application(s) stored",
        imported,
        args.file.display(),
        format,
        combined.len()
    );
    Ok(())
}

fn read_input(path: &Path) -> JobsafeResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| JobsafeError::Import(format!("Failed to read {}: {}", path.display(), e)))
}

/// Incoming records replace current ones with the same id; the rest are
/// appended in order
fn merge_by_id(current: Vec<Application>, incoming: Vec<Application>) -> Vec<Application> {
    let mut merged = current;
    let mut positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .filter(|(_, app)| !app.id.trim().is_empty())
        .map(|(i, app)| (app.id.clone(), i))
        .collect();

    for app in incoming {
        match positions.get(&app.id) {
            Some(&index) if !app.id.trim().is_empty() => merged[index] = app,
            _ => {
                if !app.id.trim().is_empty() {
                    positions.insert(app.id.clone(), merged.len());
                }
                merged.push(app);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str, company: &str) -> Application {
        Application {
            id: id.into(),
            company: company.into(),
            position: "Dev".into(),
            applied_date: "2024-01-01".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_by_id() {
        let merged = merge_by_id(
            vec![app("a", "Acme"), app("b", "Globex")],
            vec![app("b", "Globex Corp"), app("c", "Initech"), app("", "NoId")],
        );

        let companies: Vec<_> = merged.iter().map(|a| a.company.as_str()).collect();
        assert_eq!(companies, vec!["Acme", "Globex Corp", "Initech", "NoId"]);
    }

    #[test]
    fn test_merge_blank_ids_always_append() {
        let merged = merge_by_id(vec![app("", "One")], vec![app("", "Two")]);
        assert_eq!(merged.len(), 2);
    }
}
