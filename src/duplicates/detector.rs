//! Duplicate detection over record sets
//!
//! Pairwise mode scores one candidate against existing records. Bulk mode
//! scores every pair and clusters matches transitively with a disjoint-set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Application;

use super::resolution::Resolution;
use super::similarity::{normalize, score_pair, MatchConfidence};

/// Tolerance for comparing summed weights against thresholds
const SCORE_EPSILON: f64 = 1e-9;

/// Thresholds for reporting and grading matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Minimum score for a pair to be reported at all
    pub report_threshold: f64,
    /// Minimum score for a `high` confidence match
    pub high_threshold: f64,
    /// Applied dates at most this many days apart count as close
    pub date_window_days: i64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            report_threshold: 0.7,
            high_threshold: 0.9,
            date_window_days: 1,
        }
    }
}

impl DuplicateConfig {
    /// Confidence band for a score, or `None` if it is not reportable
    pub fn confidence(&self, score: f64) -> Option<MatchConfidence> {
        if score + SCORE_EPSILON >= self.high_threshold {
            Some(MatchConfidence::High)
        } else if score + SCORE_EPSILON >= self.report_threshold {
            Some(MatchConfidence::Medium)
        } else {
            None
        }
    }
}

/// An existing record that matches a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    /// Position of the match in the existing list
    pub index: usize,
    pub id: String,
    pub score: f64,
    pub confidence: MatchConfidence,
    pub reasons: Vec<String>,
}

/// Records believed to denote the same application
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Positions in the scanned list, ascending; the first is the primary
    pub indices: Vec<usize>,
    pub ids: Vec<String>,
    /// Weakest pairwise link that holds the group together
    pub confidence: f64,
    pub level: MatchConfidence,
    pub reasons: Vec<String>,
    pub recommended: Resolution,
}

impl DuplicateGroup {
    /// Position of the record that survives a merge
    pub fn primary_index(&self) -> usize {
        self.indices[0]
    }
}

/// Disjoint-set forest with path compression and union by rank
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

struct MatchEdge {
    a: usize,
    score: f64,
    reasons: Vec<String>,
}

/// Finds duplicate applications
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    config: DuplicateConfig,
}

impl DuplicateDetector {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DuplicateConfig {
        &self.config
    }

    /// Score a candidate against existing records
    ///
    /// Returns reportable matches, best first. `skip` names the candidate's
    /// own position when it is a member of `existing`; a different record
    /// that reuses the candidate's id is still scored.
    pub fn find_matches(
        &self,
        candidate: &Application,
        existing: &[Application],
        skip: Option<usize>,
    ) -> Vec<DuplicateMatch> {
        let candidate_id = candidate.id.trim();
        let mut matches: Vec<DuplicateMatch> = existing
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .filter_map(|(index, other)| {
                let result = score_pair(candidate, other, self.config.date_window_days);
                let confidence = self.config.confidence(result.score)?;
                let mut reasons = result.reasons;
                if !candidate_id.is_empty() && other.id.trim() == candidate_id {
                    reasons.push("Same id".to_string());
                }
                Some(DuplicateMatch {
                    index,
                    id: other.id.clone(),
                    score: result.score,
                    confidence,
                    reasons,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        matches
    }

    /// Cluster a whole record set into duplicate groups
    pub fn find_groups(&self, applications: &[Application]) -> Vec<DuplicateGroup> {
        let mut sets = DisjointSet::new(applications.len());
        let mut edges: Vec<MatchEdge> = Vec::new();

        for i in 0..applications.len() {
            for j in (i + 1)..applications.len() {
                let result = score_pair(
                    &applications[i],
                    &applications[j],
                    self.config.date_window_days,
                );
                if self.config.confidence(result.score).is_some() {
                    sets.union(i, j);
                    edges.push(MatchEdge {
                        a: i,
                        score: result.score,
                        reasons: result.reasons,
                    });
                }
            }
        }

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for index in 0..applications.len() {
            let root = sets.find(index);
            members.entry(root).or_default().push(index);
        }

        let mut groups: Vec<DuplicateGroup> = members
            .into_values()
            .filter(|indices| indices.len() > 1)
            .map(|indices| self.build_group(applications, indices, &edges, &mut sets))
            .collect();

        groups.sort_by_key(|g| g.primary_index());
        debug!(
            records = applications.len(),
            groups = groups.len(),
            "duplicate scan complete"
        );
        groups
    }

    fn build_group(
        &self,
        applications: &[Application],
        indices: Vec<usize>,
        edges: &[MatchEdge],
        sets: &mut DisjointSet,
    ) -> DuplicateGroup {
        let root = sets.find(indices[0]);
        let mut confidence: f64 = 1.0;
        let mut reasons: Vec<String> = Vec::new();

        for edge in edges {
            if sets.find(edge.a) != root {
                continue;
            }
            confidence = confidence.min(edge.score);
            for reason in &edge.reasons {
                if !reasons.contains(reason) {
                    reasons.push(reason.clone());
                }
            }
        }

        let level = self
            .config
            .confidence(confidence)
            .unwrap_or(MatchConfidence::Medium);
        let records: Vec<&Application> = indices.iter().map(|&i| &applications[i]).collect();
        let recommended = if level == MatchConfidence::High && fields_compatible(&records) {
            Resolution::Merge
        } else {
            Resolution::SkipDuplicates
        };

        DuplicateGroup {
            ids: records.iter().map(|a| a.id.clone()).collect(),
            indices,
            confidence,
            level,
            reasons,
            recommended,
        }
    }
}

/// Whether records can be merged without silently dropping an identity
///
/// Records conflict when they carry different posting URLs or different
/// contact emails.
pub fn fields_compatible(records: &[&Application]) -> bool {
    fn distinct(values: impl Iterator<Item = Option<String>>) -> usize {
        let mut seen: Vec<String> = Vec::new();
        for value in values.flatten() {
            let value = normalize(&value);
            if !value.is_empty() && !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen.len()
    }

    distinct(records.iter().map(|a| a.job_url.clone())) <= 1
        && distinct(records.iter().map(|a| a.contact_email.clone())) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str, company: &str, position: &str, date: &str) -> Application {
        Application {
            id: id.into(),
            company: company.into(),
            position: position.into(),
            applied_date: date.into(),
            ..Default::default()
        }
    }

    fn with_url(mut app: Application, url: &str) -> Application {
        app.job_url = Some(url.into());
        app
    }

    #[test]
    fn test_confidence_bands() {
        let config = DuplicateConfig::default();
        assert_eq!(config.confidence(0.95), Some(MatchConfidence::High));
        assert_eq!(config.confidence(0.9), Some(MatchConfidence::High));
        assert_eq!(config.confidence(0.75), Some(MatchConfidence::Medium));
        assert_eq!(config.confidence(0.35 + 0.35), Some(MatchConfidence::Medium));
        assert_eq!(config.confidence(0.69), None);
    }

    #[test]
    fn test_find_matches_sorted_and_filtered() {
        let detector = DuplicateDetector::default();
        let candidate = app("new", "Acme", "Dev", "2024-04-10");
        let existing = vec![
            app("a", "Other", "Role", "2024-04-10"),
            app("b", "Acme", "Dev", "2024-02-01"),
            app("c", "Acme", "Dev", "2024-04-10"),
        ];

        let matches = detector.find_matches(&candidate, &existing, None);
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn test_find_matches_skips_own_position() {
        let detector = DuplicateDetector::default();
        let records = vec![
            app("a", "Acme", "Dev", "2024-04-10"),
            app("b", "Globex", "Ops", "2024-01-01"),
        ];
        assert!(detector.find_matches(&records[0], &records, Some(0)).is_empty());
    }

    #[test]
    fn test_find_matches_reports_same_id_record() {
        let detector = DuplicateDetector::default();
        let candidate = with_url(app("a", "Acme", "Dev", "2024-04-10"), "https://acme.test/jobs/7");

        let matches = detector.find_matches(&candidate, &[candidate.clone()], None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].confidence, MatchConfidence::High);
        assert!(matches[0].reasons.iter().any(|r| r == "Same id"));
    }

    #[test]
    fn test_same_url_group_is_high_with_reason() {
        let detector = DuplicateDetector::default();
        let records = vec![
            with_url(app("a", "Google", "SWE", "2024-01-01"), "https://g.co/jobs/1"),
            with_url(app("b", "Google", "SWE", "2024-02-01"), "https://g.co/jobs/1"),
        ];

        let groups = detector.find_groups(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].indices, vec![0, 1]);
        assert_eq!(groups[0].level, MatchConfidence::High);
        assert!(groups[0].reasons.iter().any(|r| r.contains("URL")));
        assert_eq!(groups[0].recommended, Resolution::Merge);
    }

    #[test]
    fn test_transitive_grouping() {
        let detector = DuplicateDetector::default();
        let records = vec![
            with_url(app("a", "Acme", "Dev", "2024-01-01"), "https://acme.test/1"),
            with_url(app("b", "Beta", "QA", "2024-03-01"), "https://acme.test/1"),
            app("c", "Beta", "QA", "2024-03-01"),
            app("d", "Unrelated", "Chef", "2022-01-01"),
        ];

        let groups = detector.find_groups(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].indices, vec![0, 1, 2]);
        assert_eq!(groups[0].ids, vec!["a", "b", "c"]);
        assert!(groups[0].confidence < 1.0);
    }

    #[test]
    fn test_medium_group_recommends_skip() {
        let detector = DuplicateDetector::default();
        let records = vec![
            app("a", "Acme", "Dev", "2024-01-01"),
            app("b", "Acme", "Dev", "2024-03-01"),
        ];

        let groups = detector.find_groups(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].level, MatchConfidence::Medium);
        assert_eq!(groups[0].recommended, Resolution::SkipDuplicates);
    }

    #[test]
    fn test_conflicting_emails_block_merge() {
        let mut a = app("a", "Acme", "Dev", "2024-01-01");
        let mut b = app("b", "Acme", "Dev", "2024-01-01");
        a.contact_email = Some("one@acme.test".into());
        b.contact_email = Some("two@acme.test".into());
        assert!(!fields_compatible(&[&a, &b]));

        b.contact_email = None;
        assert!(fields_compatible(&[&a, &b]));
    }

    #[test]
    fn test_no_groups_in_distinct_set() {
        let detector = DuplicateDetector::default();
        let records = vec![
            app("a", "Acme", "Dev", "2024-01-01"),
            app("b", "Zeta", "Chef", "2024-01-01"),
        ];
        assert!(detector.find_groups(&records).is_empty());
        assert!(detector.find_groups(&[]).is_empty());
    }

    #[test]
    fn test_disjoint_set() {
        let mut sets = DisjointSet::new(5);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);
        assert_eq!(sets.find(0), sets.find(3));
        assert_ne!(sets.find(0), sets.find(2));
    }
}
