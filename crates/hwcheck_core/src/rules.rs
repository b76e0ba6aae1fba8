//! Declarative compatibility rules.
//!
//! A rule set is loaded from TOML once at startup, validated fully, and
//! treated as read-only for the process lifetime. Concurrent evaluation
//! against it needs no locking because it is never mutated after load.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RuleLoadError;
use crate::predicate::Predicate;

/// Finding severity, ordered by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hardware category a rule and its findings belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cpu,
    Memory,
    Storage,
    Network,
    Graphics,
    Firmware,
}

impl Category {
    /// Fixed presentation order within a severity tier: boot-blocking
    /// categories first. The report ordering contract depends on this.
    pub fn canonical_rank(&self) -> u8 {
        match self {
            Category::Firmware => 0,
            Category::Storage => 1,
            Category::Memory => 2,
            Category::Cpu => 3,
            Category::Network => 4,
            Category::Graphics => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Memory => "memory",
            Category::Storage => "storage",
            Category::Network => "network",
            Category::Graphics => "graphics",
            Category::Firmware => "firmware",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One compatibility rule: a predicate over the fact snapshot mapped to a
/// finding template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub predicate: Predicate,
    /// Message template. Placeholders `{memory_mib}`, `{arch}`, `{firmware}`
    /// and `{storage_gib}` are substituted from the snapshot at render time.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Validated, read-only collection of rules in load order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "rule", default)]
    rules: Vec<Rule>,
}

/// Default Debian compatibility rules, embedded at build time.
const DEFAULT_RULES: &str = include_str!("../rules/default.toml");

impl RuleSet {
    /// Parse and validate a TOML rule-set definition.
    pub fn load(source: &str) -> Result<Self, RuleLoadError> {
        let set: RuleSet = toml::from_str(source)?;

        let mut seen = HashSet::new();
        for rule in &set.rules {
            if rule.id.is_empty() {
                return Err(RuleLoadError::InvalidPredicate {
                    rule: "<unnamed>".into(),
                    reason: "rule id must not be empty".into(),
                });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleLoadError::DuplicateId(rule.id.clone()));
            }
            rule.predicate
                .validate()
                .map_err(|reason| RuleLoadError::InvalidPredicate {
                    rule: rule.id.clone(),
                    reason,
                })?;
        }

        debug!("loaded {} compatibility rules", set.rules.len());
        Ok(set)
    }

    /// Load a rule set from a file on disk.
    pub fn load_file(path: &Path) -> Result<Self, RuleLoadError> {
        let source = fs::read_to_string(path).map_err(|source| RuleLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&source)
    }

    /// The embedded default rule set shipped with the tool.
    pub fn builtin() -> Result<Self, RuleLoadError> {
        Self::load(DEFAULT_RULES)
    }

    /// Serialize back to TOML. Reloading the output yields an
    /// evaluation-equivalent rule set.
    pub fn to_toml(&self) -> Result<String, RuleLoadError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[rule]]
id = "mem-low"
category = "memory"
severity = "critical"
message = "Only {memory_mib} MiB of RAM detected"
remediation = "Add more memory"

[rule.predicate]
type = "memory_below"
bytes = 1073741824

[[rule]]
id = "secureboot"
category = "firmware"
severity = "warning"
message = "Secure Boot is enabled"

[rule.predicate]
type = "firmware_is"
mode = "uefi-secure-boot"
"#;

    #[test]
    fn test_load_valid_rule_set() {
        let set = RuleSet::load(SAMPLE).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.rules()[0].id, "mem-low");
        assert_eq!(set.rules()[0].severity, Severity::Critical);
        assert_eq!(set.rules()[1].category, Category::Firmware);
        assert_eq!(set.rules()[1].remediation, None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let doubled = format!("{SAMPLE}{}", SAMPLE.replace("secureboot", "mem-low"));
        match RuleSet::load(&doubled) {
            Err(RuleLoadError::DuplicateId(id)) => assert_eq!(id, "mem-low"),
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_enum_value_rejected_at_load() {
        let bad = SAMPLE.replace("\"critical\"", "\"fatal\"");
        assert!(matches!(RuleSet::load(&bad), Err(RuleLoadError::Parse(_))));
        let bad = SAMPLE.replace("\"memory\"", "\"chipset\"");
        assert!(matches!(RuleSet::load(&bad), Err(RuleLoadError::Parse(_))));
    }

    #[test]
    fn test_invalid_predicate_class_rejected_at_load() {
        let bad = r#"
[[rule]]
id = "bad"
category = "storage"
severity = "warning"
message = "nonsense"

[rule.predicate]
type = "any_device_missing_driver"
class = "storage"
"#;
        assert!(matches!(
            RuleSet::load(bad),
            Err(RuleLoadError::InvalidPredicate { .. })
        ));
    }

    #[test]
    fn test_round_trip_is_equivalent() {
        let set = RuleSet::load(SAMPLE).unwrap();
        let reloaded = RuleSet::load(&set.to_toml().unwrap()).unwrap();
        assert_eq!(set, reloaded);
    }

    #[test]
    fn test_builtin_rules_load_and_are_nonempty() {
        let set = RuleSet::builtin().unwrap();
        assert!(!set.is_empty());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_canonical_category_order() {
        let order = [
            Category::Firmware,
            Category::Storage,
            Category::Memory,
            Category::Cpu,
            Category::Network,
            Category::Graphics,
        ];
        for (i, cat) in order.iter().enumerate() {
            assert_eq!(cat.canonical_rank() as usize, i);
        }
    }
}
