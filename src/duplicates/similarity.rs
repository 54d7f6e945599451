//! Pairwise similarity scoring
//!
//! A weighted sum over the fields that identify a job application. An
//! identical posting URL short-circuits to a certain match.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Application;

const COMPANY_WEIGHT: f64 = 0.35;
const POSITION_WEIGHT: f64 = 0.35;
const LOCATION_WEIGHT: f64 = 0.10;
const EMAIL_WEIGHT: f64 = 0.10;
const DATE_WEIGHT: f64 = 0.10;

/// Share of the exact-match weight granted to a fuzzy name match
const FUZZY_SHARE: f64 = 0.6;

/// Jaro-Winkler similarity above which two names count as near-identical
const FUZZY_NAME_THRESHOLD: f64 = 0.9;

/// Normalized Levenshtein similarity above which locations count as equal
const LOCATION_THRESHOLD: f64 = 0.8;

/// Confidence band of a reported match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    High,
    Medium,
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// Score in [0, 1] plus the reasons that contributed to it
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityScore {
    pub score: f64,
    pub reasons: Vec<String>,
    /// Both records point at the same posting
    pub same_url: bool,
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url.as_str());
    let url = url.strip_prefix("www.").unwrap_or(url);
    url.trim_end_matches('/').to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// How closely two names agree: exact, fuzzy, or not at all
fn name_match(a: &str, b: &str) -> Option<bool> {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(true);
    }
    if strsim::jaro_winkler(&a, &b) >= FUZZY_NAME_THRESHOLD {
        return Some(false);
    }
    None
}

fn locations_near_equal(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b
        || a.starts_with(&b)
        || b.starts_with(&a)
        || strsim::normalized_levenshtein(&a, &b) >= LOCATION_THRESHOLD
}

/// Score how likely two records describe the same application
pub fn score_pair(a: &Application, b: &Application, date_window_days: i64) -> SimilarityScore {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let same_url = match (non_empty(a.job_url.as_deref()), non_empty(b.job_url.as_deref())) {
        (Some(x), Some(y)) => normalize_url(x) == normalize_url(y),
        _ => false,
    };
    if same_url {
        reasons.push("Same job URL".to_string());
    }

    match name_match(&a.company, &b.company) {
        Some(true) => {
            score += COMPANY_WEIGHT;
            reasons.push("Identical company name".to_string());
        }
        Some(false) => {
            score += COMPANY_WEIGHT * FUZZY_SHARE;
            reasons.push("Similar company name".to_string());
        }
        None => {}
    }

    match name_match(&a.position, &b.position) {
        Some(true) => {
            score += POSITION_WEIGHT;
            reasons.push("Identical position title".to_string());
        }
        Some(false) => {
            score += POSITION_WEIGHT * FUZZY_SHARE;
            reasons.push("Similar position title".to_string());
        }
        None => {}
    }

    if let (Some(x), Some(y)) = (non_empty(a.location.as_deref()), non_empty(b.location.as_deref()))
    {
        if locations_near_equal(x, y) {
            score += LOCATION_WEIGHT;
            reasons.push("Same location".to_string());
        }
    }

    if let (Some(x), Some(y)) = (
        non_empty(a.contact_email.as_deref()),
        non_empty(b.contact_email.as_deref()),
    ) {
        if x.eq_ignore_ascii_case(y) {
            score += EMAIL_WEIGHT;
            reasons.push("Same contact email".to_string());
        }
    }

    if let (Some(x), Some(y)) = (a.applied_on(), b.applied_on()) {
        let days_apart = (x - y).num_days().abs();
        if days_apart == 0 {
            score += DATE_WEIGHT;
            reasons.push("Applied on the same day".to_string());
        } else if days_apart <= date_window_days {
            score += DATE_WEIGHT / 2.0;
            reasons.push("Applied dates close".to_string());
        }
    }

    let score = if same_url { 1.0 } else { score.min(1.0) };

    SimilarityScore {
        score,
        reasons,
        same_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(company: &str, position: &str) -> Application {
        Application {
            id: Application::generate_id(),
            company: company.into(),
            position: position.into(),
            applied_date: "2024-04-10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Google   LLC "), "google llc");
    }

    #[test]
    fn test_url_normalization() {
        assert_eq!(
            normalize_url("HTTPS://www.Example.com/jobs/1/"),
            normalize_url("http://example.com/jobs/1")
        );
    }

    #[test]
    fn test_same_url_is_certain() {
        let mut a = app("Google", "SWE");
        let mut b = app("Alphabet", "Engineer");
        a.job_url = Some("https://careers.google.com/jobs/123".into());
        b.job_url = Some("https://careers.google.com/jobs/123/".into());

        let result = score_pair(&a, &b, 1);
        assert_eq!(result.score, 1.0);
        assert!(result.same_url);
        assert_eq!(result.reasons[0], "Same job URL");
    }

    #[test]
    fn test_identical_company_and_position() {
        let a = app("Google", "SWE").with_applied_date("2024-01-01");
        let b = app("google", " SWE").with_applied_date("2024-03-01");

        let result = score_pair(&a, &b, 1);
        assert!((result.score - 0.7).abs() < 1e-9);
        assert!(result.reasons.contains(&"Identical company name".to_string()));
        assert!(result.reasons.contains(&"Identical position title".to_string()));
    }

    #[test]
    fn test_close_dates_partial_weight() {
        let a = app("Acme", "Dev").with_applied_date("2024-04-10");
        let b = app("Acme", "Dev").with_applied_date("2024-04-11");
        let c = app("Acme", "Dev").with_applied_date("2024-04-15");

        let close = score_pair(&a, &b, 1);
        let far = score_pair(&a, &c, 1);
        let same = score_pair(&a, &a.clone(), 1);

        assert!(close.reasons.contains(&"Applied dates close".to_string()));
        assert!(far.score < close.score);
        assert!(close.score < same.score);
    }

    #[test]
    fn test_fuzzy_company_name() {
        let a = app("Microsoft Corporation", "Engineer");
        let b = app("Microsoft Corporatoin", "Engineer");
        let result = score_pair(&a, &b, 1);
        assert!(result.reasons.contains(&"Similar company name".to_string()));
        assert!(result.score > POSITION_WEIGHT);
    }

    #[test]
    fn test_location_prefix_counts() {
        let mut a = app("Acme", "Dev");
        let mut b = app("Acme", "Dev");
        a.location = Some("San Francisco".into());
        b.location = Some("San Francisco, CA".into());
        let result = score_pair(&a, &b, 1);
        assert!(result.reasons.contains(&"Same location".to_string()));
    }

    #[test]
    fn test_unrelated_records() {
        let a = app("Acme", "Dev").with_applied_date("2023-01-01");
        let b = app("Zeta Labs", "Designer").with_applied_date("2024-06-01");
        let result = score_pair(&a, &b, 1);
        assert_eq!(result.score, 0.0);
        assert!(result.reasons.is_empty());
    }
}
