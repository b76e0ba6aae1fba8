//! Report rendering - clean, ASCII-only terminal output.
//!
//! Severity-coded tags, most urgent findings first (the engine already
//! ordered them). Configuration and probe errors render as tool problems,
//! never as hardware findings.

use anyhow::Error;
use hwcheck_core::{
    EngineError, Finding, FindingKind, Report, RuleLoadError, Severity, Verdict,
};
use owo_colors::OwoColorize;

/// Display a finished report to the user.
pub fn display_report(report: &Report, color: bool) {
    println!();
    if report.findings.is_empty() {
        println!("No compatibility issues found.");
    }
    for finding in &report.findings {
        display_finding(finding, color);
    }

    let counts = report.counts_by_severity();
    println!();
    println!(
        "{} critical, {} warning, {} info",
        counts.critical, counts.warning, counts.info
    );

    let verdict_str = format!("Verdict: {}", report.verdict);
    if color {
        match report.verdict {
            Verdict::LikelyToFail => println!("{}", verdict_str.bright_red().bold()),
            Verdict::CaveatsPresent => println!("{}", verdict_str.yellow().bold()),
            Verdict::NoIssues => println!("{}", verdict_str.bright_green().bold()),
        }
    } else {
        println!("{}", verdict_str);
    }
    println!();
}

fn display_finding(finding: &Finding, color: bool) {
    let tag = severity_tag(finding, color);
    println!("{} {}: {}", tag, finding.category, finding.message);
    if let Some(remediation) = &finding.remediation {
        if color {
            println!("           -> {}", remediation.dimmed());
        } else {
            println!("           -> {}", remediation);
        }
    }
}

fn severity_tag(finding: &Finding, color: bool) -> String {
    // Diagnostics are tool notes, not hardware observations.
    if finding.kind == FindingKind::Diagnostic {
        return if color {
            "[NOTE]    ".dimmed().to_string()
        } else {
            "[NOTE]    ".to_string()
        };
    }
    match (finding.severity, color) {
        (Severity::Critical, true) => "[CRITICAL]".bright_red().bold().to_string(),
        (Severity::Critical, false) => "[CRITICAL]".to_string(),
        (Severity::Warning, true) => "[WARNING] ".yellow().to_string(),
        (Severity::Warning, false) => "[WARNING] ".to_string(),
        (Severity::Info, true) => "[INFO]    ".cyan().to_string(),
        (Severity::Info, false) => "[INFO]    ".to_string(),
    }
}

/// Display a top-level failure. Configuration-class errors are labelled so
/// the user is not misled into blaming their hardware.
pub fn display_error(err: &Error) {
    eprintln!();
    if err.downcast_ref::<RuleLoadError>().is_some() || err.downcast_ref::<EngineError>().is_some()
    {
        eprintln!("[CONFIG ERROR] {:#}", err);
        eprintln!("This is a tool configuration problem, not a hardware issue.");
    } else {
        eprintln!("[ERROR] {:#}", err);
    }
    eprintln!();
}
