//! Validation and repair of application record sets
//!
//! Validation never fails: it returns a [`ValidationReport`] and leaves the
//! decision to the caller. A set is valid iff the report has no critical
//! errors. [`repair_applications`] turns any set into one that validates.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobsafe::validation::{repair_applications, validate_applications};
//!
//! let report = validate_applications(&records);
//! if !report.is_valid() {
//!     let repaired = repair_applications(records).applications;
//!     assert!(validate_applications(&repaired).is_valid());
//! }
//! ```

mod repair;
mod report;
mod validator;

pub use repair::{
    repair_applications, RepairFix, RepairReport, UNKNOWN_COMPANY, UNKNOWN_POSITION,
};
pub use report::{
    IssueKind, RepairAction, RepairSuggestion, Severity, ValidationIssue, ValidationReport,
};
pub use validator::validate_applications;
