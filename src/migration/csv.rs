//! CSV migration
//!
//! One header row of record field names, then one row per record. List
//! fields are `;`-joined inside a single cell; a `;` or `\` inside an item
//! is written with a leading `\`. Quoting follows RFC 4180:
//! cells containing the delimiter, a quote or a line break are quoted and
//! embedded quotes are doubled.

use std::io::Write;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::warn;

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::{Application, ApplicationStatus};

/// Separator for list fields inside one cell
pub const LIST_SEPARATOR: char = ';';

const LIST_ESCAPE: char = '\\';

fn join_list(items: &[String]) -> String {
    let mut cell = String::new();
    for (n, item) in items.iter().enumerate() {
        if n > 0 {
            cell.push(LIST_SEPARATOR);
        }
        for c in item.chars() {
            if c == LIST_SEPARATOR || c == LIST_ESCAPE {
                cell.push(LIST_ESCAPE);
            }
            cell.push(c);
        }
    }
    cell
}

/// Split a list cell; an escape before anything but itself or the
/// separator is kept literally
fn split_list(cell: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            LIST_ESCAPE => match chars.peek() {
                Some(&next) if next == LIST_SEPARATOR || next == LIST_ESCAPE => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(c),
            },
            LIST_SEPARATOR => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// A record field addressable from a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Company,
    Position,
    Location,
    Status,
    AppliedDate,
    ResponseDate,
    InterviewDate,
    Notes,
    JobDescription,
    Salary,
    Tags,
    Requirements,
    ContactEmail,
    ContactPhone,
    JobUrl,
}

/// Header names in export order
const COLUMNS: [(&str, Column); 16] = [
    ("id", Column::Id),
    ("company", Column::Company),
    ("position", Column::Position),
    ("location", Column::Location),
    ("status", Column::Status),
    ("appliedDate", Column::AppliedDate),
    ("responseDate", Column::ResponseDate),
    ("interviewDate", Column::InterviewDate),
    ("notes", Column::Notes),
    ("jobDescription", Column::JobDescription),
    ("salary", Column::Salary),
    ("tags", Column::Tags),
    ("requirements", Column::Requirements),
    ("contactEmail", Column::ContactEmail),
    ("contactPhone", Column::ContactPhone),
    ("jobUrl", Column::JobUrl),
];

impl Column {
    fn from_header(name: &str) -> Option<Self> {
        let name = name.trim();
        COLUMNS
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, column)| *column)
    }

    fn read(self, app: &Application) -> String {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        match self {
            Self::Id => app.id.clone(),
            Self::Company => app.company.clone(),
            Self::Position => app.position.clone(),
            Self::Location => opt(&app.location),
            Self::Status => app.status.as_str().to_string(),
            Self::AppliedDate => app.applied_date.clone(),
            Self::ResponseDate => opt(&app.response_date),
            Self::InterviewDate => opt(&app.interview_date),
            Self::Notes => app.notes.clone(),
            Self::JobDescription => app.job_description.clone(),
            Self::Salary => opt(&app.salary),
            Self::Tags => join_list(&app.tags),
            Self::Requirements => join_list(&app.requirements),
            Self::ContactEmail => opt(&app.contact_email),
            Self::ContactPhone => opt(&app.contact_phone),
            Self::JobUrl => opt(&app.job_url),
        }
    }

    fn write(self, app: &mut Application, value: &str, row: usize) {
        fn opt(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        match self {
            Self::Id => app.id = value.trim().to_string(),
            Self::Company => app.company = value.trim().to_string(),
            Self::Position => app.position = value.trim().to_string(),
            Self::Location => app.location = opt(value),
            Self::Status => {
                app.status = match value.trim() {
                    "" => ApplicationStatus::default(),
                    text => text.parse().unwrap_or_else(|_| {
                        warn!(row, status = text, "unknown status, using 'applied'");
                        ApplicationStatus::default()
                    }),
                }
            }
            Self::AppliedDate => app.applied_date = value.trim().to_string(),
            Self::ResponseDate => app.response_date = opt(value),
            Self::InterviewDate => app.interview_date = opt(value),
            Self::Notes => app.notes = value.to_string(),
            Self::JobDescription => app.job_description = value.to_string(),
            Self::Salary => app.salary = opt(value),
            Self::Tags => app.tags = split_list(value),
            Self::Requirements => app.requirements = split_list(value),
            Self::ContactEmail => app.contact_email = opt(value),
            Self::ContactPhone => app.contact_phone = opt(value),
            Self::JobUrl => app.job_url = opt(value),
        }
    }
}

/// Write records as CSV with a header row
pub fn export_csv<W: Write>(applications: &[Application], writer: &mut W) -> JobsafeResult<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);

    csv_writer
        .write_record(COLUMNS.iter().map(|(header, _)| *header))
        .map_err(|e| JobsafeError::Export(e.to_string()))?;

    for app in applications {
        csv_writer
            .write_record(COLUMNS.iter().map(|(_, column)| column.read(app)))
            .map_err(|e| JobsafeError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| JobsafeError::Export(e.to_string()))?;
    Ok(())
}

/// Parse CSV with a header row into records
///
/// Columns are matched to fields by header name; unknown columns are
/// ignored and missing ones leave the field empty. A header-only input
/// yields no records.
///
/// # Errors
///
/// Empty input is an import error, as is a malformed row.
pub fn import_csv(input: &str) -> JobsafeResult<Vec<Application>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    if input.trim().is_empty() {
        return Err(JobsafeError::Import(
            "CSV input is empty; expected a header row".into(),
        ));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| JobsafeError::Import(format!("Failed to read CSV header: {}", e)))?
        .clone();
    let mapping = column_mapping(&headers);

    let mut applications = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 2;
        let record =
            result.map_err(|e| JobsafeError::Import(format!("Row {}: {}", row, e)))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut app = Application::default();
        for (cell, column) in record.iter().zip(mapping.iter()) {
            if let Some(column) = column {
                column.write(&mut app, cell, row);
            }
        }
        applications.push(app);
    }

    Ok(applications)
}

/// Column for each header position, built once per file
fn column_mapping(headers: &StringRecord) -> Vec<Option<Column>> {
    headers
        .iter()
        .map(|header| {
            let column = Column::from_header(header);
            if column.is_none() {
                warn!(column = header, "ignoring unknown CSV column");
            }
            column
        })
        .collect()
}
