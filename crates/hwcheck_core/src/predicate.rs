//! Predicate expression tree for compatibility rules.
//!
//! Predicates are data, not code: a tagged-variant tree deserialized from the
//! rule file and validated entirely at load time. Evaluation is pure and
//! always terminates (the tree is finite). The only runtime failure mode is
//! referencing a fact the probe recorded as unknown.

use serde::{Deserialize, Serialize};

use crate::error::PredicateError;
use crate::facts::{Architecture, FactSnapshot, FirmwareMode, PciDevice};

/// Device class a predicate ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Storage,
    Network,
    Graphics,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Storage => "storage",
            DeviceClass::Network => "network",
            DeviceClass::Graphics => "graphics",
        }
    }
}

/// A condition over a [`FactSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Total RAM below a threshold.
    MemoryBelow { bytes: u64 },
    /// Machine architecture equals the given one.
    ArchitectureIs { arch: Architecture },
    /// Firmware/boot mode equals the given one.
    FirmwareIs { mode: FirmwareMode },
    /// Sum of all storage device capacities below a threshold.
    TotalStorageBelow { bytes: u64 },
    /// No devices of the class were detected at all.
    NoDevices { class: DeviceClass },
    /// At least one device of the class has no kernel driver bound.
    /// Only valid for network and graphics (checked at load time).
    AnyDeviceMissingDriver { class: DeviceClass },
    /// At least one device of the class has the given PCI vendor id.
    /// Only valid for network and graphics (checked at load time).
    DeviceVendorIs { class: DeviceClass, vendor_id: u16 },
    AllOf { clauses: Vec<Predicate> },
    AnyOf { clauses: Vec<Predicate> },
    Not { clause: Box<Predicate> },
}

impl Predicate {
    /// Evaluate against a snapshot. Pure; no side effects.
    pub fn eval(&self, snapshot: &FactSnapshot) -> Result<bool, PredicateError> {
        match self {
            Predicate::MemoryBelow { bytes } => Ok(snapshot.memory_bytes < *bytes),
            Predicate::ArchitectureIs { arch } => Ok(snapshot.architecture == *arch),
            Predicate::FirmwareIs { mode } => Ok(snapshot.firmware == *mode),
            Predicate::TotalStorageBelow { bytes } => snapshot
                .total_storage_bytes()
                .map(|total| total < *bytes)
                .ok_or(PredicateError::UnknownFact("storage capacity")),
            Predicate::NoDevices { class } => Ok(match class {
                DeviceClass::Storage => snapshot.storage.is_empty(),
                DeviceClass::Network => snapshot.network.is_empty(),
                DeviceClass::Graphics => snapshot.graphics.is_empty(),
            }),
            Predicate::AnyDeviceMissingDriver { class } => {
                let devices = pci_devices(snapshot, *class)?;
                if devices.iter().any(|d| d.driver_loaded == Some(false)) {
                    return Ok(true);
                }
                if devices.iter().any(|d| d.driver_loaded.is_none()) {
                    return Err(PredicateError::UnknownFact("driver_loaded"));
                }
                Ok(false)
            }
            Predicate::DeviceVendorIs { class, vendor_id } => {
                let devices = pci_devices(snapshot, *class)?;
                if devices.iter().any(|d| d.vendor_id == Some(*vendor_id)) {
                    return Ok(true);
                }
                if devices.iter().any(|d| d.vendor_id.is_none()) {
                    return Err(PredicateError::UnknownFact("vendor_id"));
                }
                Ok(false)
            }
            Predicate::AllOf { clauses } => {
                for clause in clauses {
                    if !clause.eval(snapshot)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::AnyOf { clauses } => {
                for clause in clauses {
                    if clause.eval(snapshot)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { clause } => Ok(!clause.eval(snapshot)?),
        }
    }

    /// Load-time shape check: the fields a predicate references must exist
    /// for its device class. Returns a human-readable reason on failure.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Predicate::AnyDeviceMissingDriver {
                class: DeviceClass::Storage,
            } => Err("storage devices carry no driver_loaded fact".into()),
            Predicate::DeviceVendorIs {
                class: DeviceClass::Storage,
                ..
            } => Err("storage devices carry no vendor_id fact".into()),
            Predicate::AllOf { clauses } | Predicate::AnyOf { clauses } => {
                for clause in clauses {
                    clause.validate()?;
                }
                Ok(())
            }
            Predicate::Not { clause } => clause.validate(),
            _ => Ok(()),
        }
    }
}

fn pci_devices(
    snapshot: &FactSnapshot,
    class: DeviceClass,
) -> Result<&[PciDevice], PredicateError> {
    match class {
        DeviceClass::Network => Ok(&snapshot.network),
        DeviceClass::Graphics => Ok(&snapshot.graphics),
        // Unreachable for validated rule sets.
        DeviceClass::Storage => Err(PredicateError::UnknownFact("driver_loaded")),
    }
}
