//! Assessment report: findings plus an overall verdict.
//!
//! The report is the only artifact the presentation layer sees. It is
//! returned by value and carries no references back into the engine.

use serde::{Deserialize, Serialize};

use crate::error::PredicateError;
use crate::rules::{Category, Rule, Severity};

/// Whether a finding comes from a matching rule or from a rule that could
/// not be evaluated (tool note rather than hardware observation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Match,
    Diagnostic,
}

/// One rule's verdict on the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub kind: FindingKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Finding {
    pub(crate) fn matched(rule: &Rule, message: String) -> Self {
        Finding {
            rule_id: rule.id.clone(),
            category: rule.category,
            severity: rule.severity,
            kind: FindingKind::Match,
            message,
            remediation: rule.remediation.clone(),
        }
    }

    /// A rule whose predicate could not be decided. Info severity so a
    /// broken rule never escalates the verdict on its own.
    pub(crate) fn diagnostic(rule: &Rule, err: &PredicateError) -> Self {
        Finding {
            rule_id: rule.id.clone(),
            category: rule.category,
            severity: Severity::Info,
            kind: FindingKind::Diagnostic,
            message: format!("rule '{}' could not be evaluated: {}", rule.id, err),
            remediation: None,
        }
    }
}

/// Overall judgment derived from all findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyToFail,
    CaveatsPresent,
    NoIssues,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::LikelyToFail => "likely to fail",
            Verdict::CaveatsPresent => "caveats present",
            Verdict::NoIssues => "no issues detected",
        };
        write!(f, "{}", s)
    }
}

/// Per-severity finding tally, for the presentation layer's summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Ordered findings plus the derived verdict. Immutable value; repeated
/// evaluation of the same inputs produces a byte-identical serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
}

impl Report {
    /// Assemble a report from already-ordered findings. Pure; no failure
    /// modes.
    pub fn assemble(findings: Vec<Finding>, verdict: Verdict) -> Self {
        Report { findings, verdict }
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    pub fn counts_by_severity(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            rule_id: "r".into(),
            category: Category::Memory,
            severity,
            kind: FindingKind::Match,
            message: "m".into(),
            remediation: None,
        }
    }

    #[test]
    fn test_worst_severity_and_counts() {
        let report = Report::assemble(
            vec![
                finding(Severity::Warning),
                finding(Severity::Critical),
                finding(Severity::Info),
                finding(Severity::Warning),
            ],
            Verdict::LikelyToFail,
        );
        assert_eq!(report.worst_severity(), Some(Severity::Critical));
        assert_eq!(
            report.counts_by_severity(),
            SeverityCounts {
                critical: 1,
                warning: 2,
                info: 1
            }
        );
    }

    #[test]
    fn test_empty_report_has_no_worst_severity() {
        let report = Report::assemble(vec![], Verdict::NoIssues);
        assert_eq!(report.worst_severity(), None);
        assert_eq!(report.counts_by_severity(), SeverityCounts::default());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::LikelyToFail.to_string(), "likely to fail");
        assert_eq!(Verdict::CaveatsPresent.to_string(), "caveats present");
        assert_eq!(Verdict::NoIssues.to_string(), "no issues detected");
    }
}
