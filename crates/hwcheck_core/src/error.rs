//! Error types for the assessment engine.
//!
//! Three classes with different propagation policies: `ProbeError` aborts the
//! assessment ("assessment could not run"), `RuleLoadError` and `EngineError`
//! are configuration problems surfaced as tool malfunctions, and
//! `PredicateError` is recovered inside the engine as a diagnostic finding.

use std::path::PathBuf;
use thiserror::Error;

/// Hardware facts could not be captured.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A fact the engine cannot run without (architecture, total memory).
    /// Optional facts degrade to "unknown" instead of raising this.
    #[error("mandatory fact '{fact}' unavailable: {reason}")]
    MandatoryFact { fact: &'static str, reason: String },

    #[error("I/O error while probing: {0}")]
    Io(#[from] std::io::Error),
}

/// A rule-set definition was malformed. Raised at load time only; the
/// engine never sees an invalid rule.
#[derive(Error, Debug)]
pub enum RuleLoadError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed rule definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize rule set: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("duplicate rule id '{0}'")]
    DuplicateId(String),

    #[error("rule '{rule}': {reason}")]
    InvalidPredicate { rule: String, reason: String },
}

/// Evaluation preconditions not met.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("rule set is empty; nothing to evaluate")]
    EmptyRuleSet,
}

/// A single predicate could not be decided against a snapshot. Recovered
/// locally by the engine as an info-level diagnostic finding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("fact '{0}' is unknown in this snapshot")]
    UnknownFact(&'static str),
}
