//! Rule engine: one synchronous evaluation pass per assessment.
//!
//! Every rule is evaluated against the snapshot in load order; results are
//! sorted afterwards, so the ordering contract holds no matter how the pass
//! is scheduled. A predicate that cannot be decided is downgraded to an
//! info-level diagnostic finding instead of aborting the pass.

use std::cmp::Reverse;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::facts::FactSnapshot;
use crate::report::{Finding, Report, Verdict};
use crate::rules::{RuleSet, Severity};

/// Evaluate a rule set against a fact snapshot and produce the report.
///
/// Fails only on an empty rule set, which is a configuration error rather
/// than a statement about the hardware.
pub fn evaluate(snapshot: &FactSnapshot, rules: &RuleSet) -> Result<Report, EngineError> {
    if rules.is_empty() {
        return Err(EngineError::EmptyRuleSet);
    }

    let mut findings = Vec::new();
    for rule in rules.rules() {
        match rule.predicate.eval(snapshot) {
            Ok(true) => {
                debug!(rule = %rule.id, severity = %rule.severity, "rule matched");
                findings.push(Finding::matched(rule, render_message(&rule.message, snapshot)));
            }
            Ok(false) => {}
            Err(err) => {
                // One broken rule must not block reporting on the others.
                warn!(rule = %rule.id, error = %err, "rule failed to evaluate");
                findings.push(Finding::diagnostic(rule, &err));
            }
        }
    }

    // Most urgent first; canonical category order and rule id break ties so
    // the sequence is deterministic for identical inputs.
    findings.sort_by(|a, b| {
        (Reverse(a.severity), a.category.canonical_rank(), &a.rule_id)
            .cmp(&(Reverse(b.severity), b.category.canonical_rank(), &b.rule_id))
    });

    let verdict = derive_verdict(&findings);
    Ok(Report::assemble(findings, verdict))
}

/// Verdict from the highest-severity finding per category: the worst
/// category wins. Lower-severity findings in the same category are kept in
/// the report but do not weigh in here.
fn derive_verdict(findings: &[Finding]) -> Verdict {
    match findings.iter().map(|f| f.severity).max() {
        Some(Severity::Critical) => Verdict::LikelyToFail,
        Some(Severity::Warning) => Verdict::CaveatsPresent,
        Some(Severity::Info) | None => Verdict::NoIssues,
    }
}

/// Substitute snapshot facts into a message template.
fn render_message(template: &str, snapshot: &FactSnapshot) -> String {
    if !template.contains('{') {
        return template.to_string();
    }
    let storage_gib = match snapshot.total_storage_bytes() {
        Some(bytes) => format!("{:.1}", bytes as f64 / (1024.0 * 1024.0 * 1024.0)),
        None => "unknown".to_string(),
    };
    template
        .replace("{memory_mib}", &snapshot.memory_mib().to_string())
        .replace("{arch}", snapshot.architecture.as_str())
        .replace("{firmware}", snapshot.firmware.as_str())
        .replace("{storage_gib}", &storage_gib)
}
