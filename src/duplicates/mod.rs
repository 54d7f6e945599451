//! Duplicate detection and resolution
//!
//! # Architecture
//!
//! - `similarity`: weighted pairwise scoring with human-readable reasons
//! - `DuplicateDetector`: pairwise matching against existing records, and
//!   bulk grouping with transitive clustering
//! - `merge`: field-level merge policy and merge previews
//! - `resolution`: applying merge / skip / keep-newest decisions
//!
//! # Example
//!
//! ```rust,ignore
//! use jobsafe::duplicates::{apply_resolutions, DuplicateDetector, ResolutionDecision};
//!
//! let detector = DuplicateDetector::default();
//! let groups = detector.find_groups(&records);
//! let outcome = apply_resolutions(&records, &ResolutionDecision::recommended(groups));
//! assert!(outcome.summary.is_consistent());
//! ```

mod detector;
mod merge;
mod resolution;
mod similarity;

pub use detector::{
    fields_compatible, DuplicateConfig, DuplicateDetector, DuplicateGroup, DuplicateMatch,
};
pub use merge::{merge_applications, preview_merge, MergePreview, NOTES_SEPARATOR};
pub use resolution::{
    apply_resolutions, GroupOutcome, Resolution, ResolutionDecision, ResolutionOutcome,
    ResolutionSummary,
};
pub use similarity::{normalize, score_pair, MatchConfidence, SimilarityScore};
