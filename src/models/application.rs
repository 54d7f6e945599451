//! Job application record
//!
//! The unit of data under management. Dates are kept as the text the user
//! entered so that malformed values survive until validation reports them;
//! use [`parse_date`] to interpret them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::ApplicationStatus;

/// Date formats accepted for date-valued fields
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// A tracked job application
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Unique identifier within a record set
    #[serde(default)]
    pub id: String,

    /// Employer name
    #[serde(default)]
    pub company: String,

    /// Position title
    #[serde(default)]
    pub position: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub status: ApplicationStatus,

    /// Date the application was sent (required)
    #[serde(default)]
    pub applied_date: String,

    /// Date of the latest employer response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<String>,

    /// Free-form notes
    #[serde(default)]
    pub notes: String,

    /// Copy of the job posting text
    #[serde(default)]
    pub job_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Requirements listed in the posting
    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,

    /// Link to the job posting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
}

impl Application {
    /// Create a new application with a fresh id, applied today
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            id: Self::generate_id(),
            company: company.into(),
            position: position.into(),
            applied_date: today(),
            ..Default::default()
        }
    }

    /// Generate a new unique application id
    pub fn generate_id() -> String {
        format!("app-{}", uuid::Uuid::new_v4().simple())
    }

    /// Builder-style setter for the applied date
    pub fn with_applied_date(mut self, date: impl Into<String>) -> Self {
        self.applied_date = date.into();
        self
    }

    /// Builder-style setter for the status
    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }

    /// Parsed applied date, if present and valid
    pub fn applied_on(&self) -> Option<NaiveDate> {
        parse_date(&self.applied_date)
    }

    /// Parsed response date, if present and valid
    pub fn responded_on(&self) -> Option<NaiveDate> {
        self.response_date.as_deref().and_then(parse_date)
    }

    /// Human label used in summaries ("Company - Position")
    pub fn label(&self) -> String {
        format!("{} - {}", self.company.trim(), self.position.trim())
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label(), self.status)
    }
}

/// Parse a user-entered date in any supported format
///
/// Accepts plain calendar dates as well as RFC 3339 and naive timestamps,
/// in which case only the date component is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Today's date in ISO calendar form
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
