//! Hardware fact model.
//!
//! The probe normalizes everything it observes into a [`FactSnapshot`]: one
//! immutable value per assessment run. Facts the probe could not read are
//! recorded as `None` ("unknown") rather than dropped, so predicates can
//! distinguish "absent" from "unreadable".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CPU architecture of the machine under assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86_64,
    Arm64,
    I686,
    Riscv64,
    Unknown,
}

impl Architecture {
    /// Map a compile-target arch string (`std::env::consts::ARCH`) into the
    /// closed enum.
    pub fn from_target(target: &str) -> Self {
        match target {
            "x86_64" => Architecture::X86_64,
            "aarch64" => Architecture::Arm64,
            "x86" => Architecture::I686,
            "riscv64" => Architecture::Riscv64,
            _ => Architecture::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
            Architecture::I686 => "i686",
            Architecture::Riscv64 => "riscv64",
            Architecture::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Firmware and boot mode the machine is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirmwareMode {
    LegacyBios,
    Uefi,
    UefiSecureBoot,
}

impl FirmwareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirmwareMode::LegacyBios => "legacy-bios",
            FirmwareMode::Uefi => "uefi",
            FirmwareMode::UefiSecureBoot => "uefi-secure-boot",
        }
    }
}

impl std::fmt::Display for FirmwareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bus a storage device hangs off, inferred from the kernel device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    Nvme,
    Scsi,
    Virtio,
    Mmc,
    Unknown,
}

/// A block device that could serve as an install target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDevice {
    /// Kernel name, e.g. `nvme0n1` or `sda`.
    pub name: String,
    /// Capacity in bytes; `None` when the size attribute was unreadable.
    pub capacity_bytes: Option<u64>,
    pub bus: BusType,
}

/// A PCI-attached device (network interface or graphics adapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDevice {
    /// Kernel name, e.g. `wlp3s0` or `card0`.
    pub name: String,
    pub vendor_id: Option<u16>,
    pub device_id: Option<u16>,
    /// Whether a kernel driver is bound; `None` when undeterminable.
    pub driver_loaded: Option<bool>,
}

/// Immutable snapshot of the machine's hardware facts, captured once per
/// assessment run. Constructed by a [`crate::probe::Probe`] (or directly in
/// tests) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSnapshot {
    pub architecture: Architecture,
    pub memory_bytes: u64,
    pub storage: Vec<StorageDevice>,
    pub network: Vec<PciDevice>,
    pub graphics: Vec<PciDevice>,
    pub firmware: FirmwareMode,
    pub captured_at: DateTime<Utc>,
}

impl FactSnapshot {
    /// Total capacity across all storage devices. `None` when any device's
    /// capacity is unknown, since a partial sum would understate the truth.
    pub fn total_storage_bytes(&self) -> Option<u64> {
        self.storage
            .iter()
            .map(|d| d.capacity_bytes)
            .try_fold(0u64, |acc, cap| cap.map(|c| acc + c))
    }

    pub fn memory_mib(&self) -> u64 {
        self.memory_bytes / (1024 * 1024)
    }
}
