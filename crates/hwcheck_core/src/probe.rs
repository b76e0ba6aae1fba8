//! Hardware probing via procfs and sysfs.
//!
//! The probe performs bounded, read-only queries and normalizes everything
//! into a [`FactSnapshot`]. Architecture and total memory are mandatory;
//! anything else that cannot be read degrades to "unknown" instead of
//! aborting the capture.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::error::ProbeError;
use crate::facts::{
    Architecture, BusType, FactSnapshot, FirmwareMode, PciDevice, StorageDevice,
};

/// Capture seam between the engine and the machine. Injected so assessments
/// can run against synthetic snapshots in tests and in the installer's
/// preview mode.
pub trait Probe {
    fn capture(&self) -> Result<FactSnapshot, ProbeError>;
}

/// Probe backed by the live procfs/sysfs trees. Roots are overridable so
/// tests can point it at a scratch directory.
pub struct LinuxProbe {
    proc_root: PathBuf,
    sys_root: PathBuf,
}

impl Default for LinuxProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxProbe {
    pub fn new() -> Self {
        LinuxProbe {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
        }
    }

    pub fn with_roots(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        LinuxProbe {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
        }
    }

    fn total_memory(&self) -> Result<u64, ProbeError> {
        let path = self.proc_root.join("meminfo");
        let content = fs::read_to_string(&path).map_err(|e| ProbeError::MandatoryFact {
            fact: "memory",
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        content
            .lines()
            .find(|line| line.starts_with("MemTotal:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .ok_or_else(|| ProbeError::MandatoryFact {
                fact: "memory",
                reason: format!("no parsable MemTotal line in {}", path.display()),
            })
    }

    fn storage_devices(&self) -> Result<Vec<StorageDevice>, ProbeError> {
        let mut devices = Vec::new();
        for name in list_dir(&self.sys_root.join("block"))? {
            if is_virtual_block_device(&name) {
                continue;
            }
            let capacity_bytes = fs::read_to_string(self.sys_root.join("block").join(&name).join("size"))
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|sectors| sectors * 512);
            if capacity_bytes.is_none() {
                warn!(device = %name, "block device size unreadable, recording as unknown");
            }
            devices.push(StorageDevice {
                bus: bus_from_name(&name),
                name,
                capacity_bytes,
            });
        }
        Ok(devices)
    }

    fn network_devices(&self) -> Result<Vec<PciDevice>, ProbeError> {
        let class_dir = self.sys_root.join("class").join("net");
        let mut devices = Vec::new();
        for name in list_dir(&class_dir)? {
            if name == "lo" {
                continue;
            }
            let device_dir = class_dir.join(&name).join("device");
            // Interfaces without a backing device (bridges, veth) are not
            // hardware and say nothing about compatibility.
            if !device_dir.exists() {
                continue;
            }
            devices.push(self.pci_device(name, &device_dir));
        }
        Ok(devices)
    }

    fn graphics_devices(&self) -> Result<Vec<PciDevice>, ProbeError> {
        let class_dir = self.sys_root.join("class").join("drm");
        let mut devices = Vec::new();
        for name in list_dir(&class_dir)? {
            // Only the card nodes themselves, not connectors like
            // card0-HDMI-A-1.
            let is_card = name
                .strip_prefix("card")
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
            if !is_card {
                continue;
            }
            let device_dir = class_dir.join(&name).join("device");
            devices.push(self.pci_device(name, &device_dir));
        }
        Ok(devices)
    }

    fn pci_device(&self, name: String, device_dir: &Path) -> PciDevice {
        let driver_loaded = match fs::symlink_metadata(device_dir.join("driver")) {
            Ok(_) => Some(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Some(false),
            Err(_) => None,
        };
        PciDevice {
            vendor_id: read_hex_id(&device_dir.join("vendor")),
            device_id: read_hex_id(&device_dir.join("device")),
            driver_loaded,
            name,
        }
    }

    fn firmware_mode(&self) -> FirmwareMode {
        let efi_dir = self.sys_root.join("firmware").join("efi");
        if !efi_dir.exists() {
            return FirmwareMode::LegacyBios;
        }
        if secure_boot_enabled(&efi_dir.join("efivars")) {
            FirmwareMode::UefiSecureBoot
        } else {
            FirmwareMode::Uefi
        }
    }
}

impl Probe for LinuxProbe {
    fn capture(&self) -> Result<FactSnapshot, ProbeError> {
        let architecture = Architecture::from_target(std::env::consts::ARCH);
        let memory_bytes = self.total_memory()?;
        let storage = self.storage_devices()?;
        let network = self.network_devices()?;
        let graphics = self.graphics_devices()?;
        let firmware = self.firmware_mode();

        let snapshot = FactSnapshot {
            architecture,
            memory_bytes,
            storage,
            network,
            graphics,
            firmware,
            captured_at: Utc::now(),
        };
        info!(
            "captured hardware facts: {} / {} MiB RAM / {} disks / {} NICs / {} GPUs / {}",
            snapshot.architecture,
            snapshot.memory_mib(),
            snapshot.storage.len(),
            snapshot.network.len(),
            snapshot.graphics.len(),
            snapshot.firmware
        );
        Ok(snapshot)
    }
}

/// Directory entries sorted by name so snapshots are deterministic. A
/// missing directory is an empty device class; any other failure means a
/// required device table is unreadable.
fn list_dir(dir: &Path) -> Result<Vec<String>, ProbeError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ProbeError::Io(e)),
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

fn is_virtual_block_device(name: &str) -> bool {
    const VIRTUAL_PREFIXES: &[&str] = &["loop", "ram", "zram", "fd", "sr", "dm-", "md"];
    VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn bus_from_name(name: &str) -> BusType {
    if name.starts_with("nvme") {
        BusType::Nvme
    } else if name.starts_with("mmcblk") {
        BusType::Mmc
    } else if name.starts_with("vd") {
        BusType::Virtio
    } else if name.starts_with("sd") {
        BusType::Scsi
    } else {
        BusType::Unknown
    }
}

/// Parse a sysfs id attribute like `0x8086`.
fn read_hex_id(path: &Path) -> Option<u16> {
    let content = fs::read_to_string(path).ok()?;
    u16::from_str_radix(content.trim().trim_start_matches("0x"), 16).ok()
}

/// The SecureBoot efivar payload is 4 attribute bytes followed by the value.
fn secure_boot_enabled(efivars_dir: &Path) -> bool {
    let Ok(names) = fs::read_dir(efivars_dir) else {
        return false;
    };
    for entry in names.filter_map(|e| e.ok()) {
        if entry
            .file_name()
            .to_string_lossy()
            .starts_with("SecureBoot-")
        {
            if let Ok(data) = fs::read(entry.path()) {
                return data.last() == Some(&1);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    struct FakeSysfs {
        root: TempDir,
    }

    impl FakeSysfs {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            fs::create_dir_all(root.path().join("proc")).unwrap();
            fs::create_dir_all(root.path().join("sys/block")).unwrap();
            fs::create_dir_all(root.path().join("sys/class/net")).unwrap();
            fs::create_dir_all(root.path().join("sys/class/drm")).unwrap();
            FakeSysfs { root }
        }

        fn probe(&self) -> LinuxProbe {
            LinuxProbe::with_roots(self.root.path().join("proc"), self.root.path().join("sys"))
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn meminfo(&self, total_kb: u64) {
            self.write(
                "proc/meminfo",
                &format!("MemTotal:       {total_kb} kB\nMemFree:        1024 kB\n"),
            );
        }
    }

    #[test]
    fn test_missing_meminfo_aborts_capture() {
        let fake = FakeSysfs::new();
        match fake.probe().capture() {
            Err(ProbeError::MandatoryFact { fact, .. }) => assert_eq!(fact, "memory"),
            other => panic!("expected MandatoryFact, got {other:?}"),
        }
    }

    #[test]
    fn test_memory_parsed_from_meminfo() {
        let fake = FakeSysfs::new();
        fake.meminfo(8 * 1024 * 1024);
        let snap = fake.probe().capture().unwrap();
        assert_eq!(snap.memory_bytes, 8 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_storage_devices_with_unknown_capacity() {
        let fake = FakeSysfs::new();
        fake.meminfo(1024 * 1024);
        // 1 GiB disk plus one whose size attribute is missing.
        fake.write("sys/block/nvme0n1/size", "2097152\n");
        fs::create_dir_all(fake.root.path().join("sys/block/sda")).unwrap();
        // Virtual devices are skipped outright.
        fake.write("sys/block/loop0/size", "8\n");
        fake.write("sys/block/zram0/size", "16\n");

        let snap = fake.probe().capture().unwrap();
        assert_eq!(snap.storage.len(), 2);
        assert_eq!(snap.storage[0].name, "nvme0n1");
        assert_eq!(snap.storage[0].bus, BusType::Nvme);
        assert_eq!(snap.storage[0].capacity_bytes, Some(1024 * 1024 * 1024));
        assert_eq!(snap.storage[1].name, "sda");
        assert_eq!(snap.storage[1].bus, BusType::Scsi);
        assert_eq!(snap.storage[1].capacity_bytes, None);
    }

    #[test]
    fn test_network_devices_and_driver_state() {
        let fake = FakeSysfs::new();
        fake.meminfo(1024 * 1024);

        // NIC with vendor/device ids and a bound driver.
        fake.write("sys/class/net/eth0/device/vendor", "0x8086\n");
        fake.write("sys/class/net/eth0/device/device", "0x15b8\n");
        let driver_target = fake.root.path().join("sys/bus/pci/drivers/e1000e");
        fs::create_dir_all(&driver_target).unwrap();
        symlink(
            &driver_target,
            fake.root.path().join("sys/class/net/eth0/device/driver"),
        )
        .unwrap();

        // NIC with no driver bound.
        fake.write("sys/class/net/wlan0/device/vendor", "0x14e4\n");
        fake.write("sys/class/net/wlan0/device/device", "0x43a0\n");

        // Loopback and virtual interfaces are not hardware.
        fs::create_dir_all(fake.root.path().join("sys/class/net/lo")).unwrap();
        fs::create_dir_all(fake.root.path().join("sys/class/net/docker0")).unwrap();

        let snap = fake.probe().capture().unwrap();
        assert_eq!(snap.network.len(), 2);
        assert_eq!(snap.network[0].name, "eth0");
        assert_eq!(snap.network[0].vendor_id, Some(0x8086));
        assert_eq!(snap.network[0].device_id, Some(0x15b8));
        assert_eq!(snap.network[0].driver_loaded, Some(true));
        assert_eq!(snap.network[1].name, "wlan0");
        assert_eq!(snap.network[1].driver_loaded, Some(false));
    }

    #[test]
    fn test_graphics_cards_only_card_nodes() {
        let fake = FakeSysfs::new();
        fake.meminfo(1024 * 1024);
        fake.write("sys/class/drm/card0/device/vendor", "0x10de\n");
        fake.write("sys/class/drm/card0/device/device", "0x2484\n");
        fs::create_dir_all(fake.root.path().join("sys/class/drm/card0-HDMI-A-1")).unwrap();
        fs::create_dir_all(fake.root.path().join("sys/class/drm/renderD128")).unwrap();

        let snap = fake.probe().capture().unwrap();
        assert_eq!(snap.graphics.len(), 1);
        assert_eq!(snap.graphics[0].name, "card0");
        assert_eq!(snap.graphics[0].vendor_id, Some(0x10de));
        assert_eq!(snap.graphics[0].driver_loaded, Some(false));
    }

    #[test]
    fn test_unreadable_device_table_aborts_capture() {
        let fake = FakeSysfs::new();
        fake.meminfo(1024 * 1024);
        // The table exists but cannot be listed (a file where the class
        // directory should be). Distinct from an absent directory, which
        // just means an empty device class.
        fs::remove_dir(fake.root.path().join("sys/class/drm")).unwrap();
        fs::write(fake.root.path().join("sys/class/drm"), "").unwrap();
        assert!(matches!(fake.probe().capture(), Err(ProbeError::Io(_))));
    }

    #[test]
    fn test_firmware_mode_detection() {
        let fake = FakeSysfs::new();
        fake.meminfo(1024 * 1024);
        assert_eq!(
            fake.probe().capture().unwrap().firmware,
            FirmwareMode::LegacyBios
        );

        fs::create_dir_all(fake.root.path().join("sys/firmware/efi/efivars")).unwrap();
        assert_eq!(fake.probe().capture().unwrap().firmware, FirmwareMode::Uefi);

        let efivar = fake
            .root
            .path()
            .join("sys/firmware/efi/efivars/SecureBoot-8be4df61-93ca-11d2-aa0d-00e098032b8c");
        fs::write(&efivar, [0x06, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(
            fake.probe().capture().unwrap().firmware,
            FirmwareMode::UefiSecureBoot
        );

        fs::write(&efivar, [0x06, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(fake.probe().capture().unwrap().firmware, FirmwareMode::Uefi);
    }
}
