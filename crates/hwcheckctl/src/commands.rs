//! Command handlers for hwcheckctl.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use hwcheck_core::{evaluate, LinuxProbe, Probe, RuleSet, Verdict};

use crate::config::CtlConfig;
use crate::render;

/// Run the assessment: capture, evaluate, render.
pub fn check(
    config: &CtlConfig,
    rules_path: Option<&Path>,
    json: bool,
    color: bool,
) -> Result<ExitCode> {
    let rules = effective_rules(config, rules_path)?;
    let snapshot = LinuxProbe::new()
        .capture()
        .context("assessment could not run")?;
    let report = evaluate(&snapshot, &rules)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::display_report(&report, color);
    }

    Ok(match report.verdict {
        Verdict::NoIssues => ExitCode::SUCCESS,
        Verdict::CaveatsPresent => ExitCode::from(1),
        Verdict::LikelyToFail => ExitCode::from(2),
    })
}

/// Capture and dump the raw fact snapshot, for bug reports and support.
pub fn snapshot() -> Result<ExitCode> {
    let snapshot = LinuxProbe::new()
        .capture()
        .context("assessment could not run")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(ExitCode::SUCCESS)
}

/// Validate a rule file without touching the hardware.
pub fn rules_validate(file: &Path) -> Result<ExitCode> {
    let rules = RuleSet::load_file(file)
        .with_context(|| format!("rule file {} is not usable", file.display()))?;
    println!("[OK] {} rules loaded from {}", rules.len(), file.display());
    Ok(ExitCode::SUCCESS)
}

/// Print the effective rule set as TOML.
pub fn rules_show(config: &CtlConfig, rules_path: Option<&Path>) -> Result<ExitCode> {
    let rules = effective_rules(config, rules_path)?;
    print!("{}", rules.to_toml()?);
    Ok(ExitCode::SUCCESS)
}

/// CLI flag beats config file beats the built-in set.
fn effective_rules(config: &CtlConfig, rules_path: Option<&Path>) -> Result<RuleSet> {
    let path = rules_path.or(config.rules_file.as_deref());
    let rules = match path {
        Some(path) => RuleSet::load_file(path)
            .with_context(|| format!("rule file {} is not usable", path.display()))?,
        None => RuleSet::builtin()?,
    };
    Ok(rules)
}
