//! Application pipeline status
//!
//! Statuses are totally ordered by how far along the hiring pipeline they
//! are. Merging duplicate records keeps the most advanced status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an application currently sits in the hiring pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Application submitted, no response yet
    #[default]
    Applied,
    /// At least one interview scheduled or held
    Interviewing,
    /// Employer declined
    Rejected,
    /// Offer extended
    Offered,
    /// Offer accepted
    Accepted,
}

impl ApplicationStatus {
    /// All statuses in pipeline order
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Applied,
        Self::Interviewing,
        Self::Rejected,
        Self::Offered,
        Self::Accepted,
    ];

    /// Position in the pipeline; higher is later.
    ///
    /// The three terminal statuses are ranked Rejected < Offered < Accepted
    /// so that merges always have a single winner.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Applied => 0,
            Self::Interviewing => 1,
            Self::Rejected => 2,
            Self::Offered => 3,
            Self::Accepted => 4,
        }
    }

    /// Stable lowercase name, as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Rejected => "rejected",
            Self::Offered => "offered",
            Self::Accepted => "accepted",
        }
    }

    /// Return whichever of two statuses is further along
    pub fn most_advanced(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl PartialOrd for ApplicationStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApplicationStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "Applied"),
            Self::Interviewing => write!(f, "Interviewing"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Offered => write!(f, "Offered"),
            Self::Accepted => write!(f, "Accepted"),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied" | "submitted" | "pending" => Ok(Self::Applied),
            "interviewing" | "interview" | "interviewed" => Ok(Self::Interviewing),
            "rejected" | "declined" => Ok(Self::Rejected),
            "offered" | "offer" => Ok(Self::Offered),
            "accepted" | "hired" => Ok(Self::Accepted),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        assert!(ApplicationStatus::Applied < ApplicationStatus::Interviewing);
        assert!(ApplicationStatus::Interviewing < ApplicationStatus::Rejected);
        assert!(ApplicationStatus::Interviewing < ApplicationStatus::Offered);
        assert!(ApplicationStatus::Offered < ApplicationStatus::Accepted);
    }

    #[test]
    fn test_most_advanced_never_regresses() {
        for a in ApplicationStatus::ALL {
            for b in ApplicationStatus::ALL {
                let winner = a.most_advanced(b);
                assert!(winner >= a && winner >= b);
                assert_eq!(winner, b.most_advanced(a));
            }
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            "Interview".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Interviewing
        );
        assert_eq!(
            " OFFER ".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Offered
        );
        assert!("ghosted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ApplicationStatus::Interviewing).unwrap();
        assert_eq!(json, "\"interviewing\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(parsed, ApplicationStatus::Accepted);
    }
}
