//! Hardware compatibility assessment engine.
//!
//! Assesses whether the current machine is likely to work with a
//! Debian-family install before committing to it: a [`probe::Probe`]
//! captures an immutable [`facts::FactSnapshot`], [`engine::evaluate`] runs
//! a declarative [`rules::RuleSet`] over it, and the resulting
//! [`report::Report`] carries severity-ordered findings plus an overall
//! verdict. The engine never modifies the system; it only observes and
//! reports.

pub mod engine;
pub mod error;
pub mod facts;
pub mod predicate;
pub mod probe;
pub mod report;
pub mod rules;

pub use engine::evaluate;
pub use error::{EngineError, PredicateError, ProbeError, RuleLoadError};
pub use facts::{Architecture, BusType, FactSnapshot, FirmwareMode, PciDevice, StorageDevice};
pub use predicate::{DeviceClass, Predicate};
pub use probe::{LinuxProbe, Probe};
pub use report::{Finding, FindingKind, Report, SeverityCounts, Verdict};
pub use rules::{Category, Rule, RuleSet, Severity};
