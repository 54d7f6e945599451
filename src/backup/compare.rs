//! Comparing snapshots with each other or with the live set

use std::fmt;
use std::str::FromStr;

use crate::diff::{diff_record_sets, RecordSetDiff};
use crate::error::JobsafeResult;
use crate::models::Application;

use super::manager::BackupManager;

/// One side of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    /// A stored snapshot, by id
    Backup(String),
    /// The live record set
    Current,
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup(id) => write!(f, "{}", id),
            Self::Current => write!(f, "current"),
        }
    }
}

impl FromStr for VersionRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("current") {
            Ok(Self::Current)
        } else {
            Ok(Self::Backup(s.to_string()))
        }
    }
}

impl BackupManager {
    fn records_for(&self, version: &VersionRef) -> JobsafeResult<Vec<Application>> {
        match version {
            VersionRef::Current => self.load_applications(),
            VersionRef::Backup(id) => Ok(self.load_snapshot(id)?.applications),
        }
    }

    /// Records added, removed and modified going from `from` to `to`
    pub fn compare_versions(
        &self,
        from: &VersionRef,
        to: &VersionRef,
    ) -> JobsafeResult<RecordSetDiff> {
        let old = self.records_for(from)?;
        let new = self.records_for(to)?;
        Ok(diff_record_sets(&old, &new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::manager::tests::{manager_with, sample_apps};
    use crate::models::{ApplicationStatus, BackupType};

    #[test]
    fn test_parse_version_ref() {
        assert_eq!("current".parse::<VersionRef>().unwrap(), VersionRef::Current);
        assert_eq!(
            "123-0-abc".parse::<VersionRef>().unwrap(),
            VersionRef::Backup("123-0-abc".into())
        );
    }

    #[test]
    fn test_compare_backup_with_current() {
        let (manager, _store) = manager_with(10);
        let apps = sample_apps();
        let meta = manager
            .create_backup(&apps, "base", BackupType::Manual, vec![])
            .unwrap();

        let mut live = apps.clone();
        live[1].status = ApplicationStatus::Offered;
        live.remove(0);
        live.push(Application::new("Initech", "Analyst"));
        manager.save_applications(&live).unwrap();

        let diff = manager
            .compare_versions(&VersionRef::Backup(meta.id.clone()), &VersionRef::Current)
            .unwrap();
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed[0].id, "app-1");
        assert_eq!(diff.modified[0].id, "app-2");
        assert_eq!(
            diff.modified[0].changes,
            vec!["status: \"interviewing\" -> \"offered\""]
        );
    }

    #[test]
    fn test_compare_two_backups() {
        let (manager, _store) = manager_with(10);
        let a = manager
            .create_backup(&sample_apps(), "a", BackupType::Manual, vec![])
            .unwrap();
        let b = manager
            .create_backup(&sample_apps(), "b", BackupType::Manual, vec![])
            .unwrap();

        let diff = manager
            .compare_versions(&VersionRef::Backup(a.id), &VersionRef::Backup(b.id))
            .unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_compare_unknown_backup() {
        let (manager, _store) = manager_with(10);
        let err = manager
            .compare_versions(&VersionRef::Backup("nope".into()), &VersionRef::Current)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
