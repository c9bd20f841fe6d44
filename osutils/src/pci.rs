//! PCI device visibility through sysfs.
//!
//! Removing a device writes `1` to `<sysfs>/bus/pci/devices/<address>/remove`,
//! after which the kernel drops the device directory. Writing `1` to
//! `<sysfs>/bus/pci/rescan` brings every removed device back.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Error};
use log::{debug, info};
use regex::Regex;

use crate::files;

/// Domain:bus:device.function, e.g. `0000:04:00.0`.
const PCI_ADDRESS_PATTERN: &str = r"^[0-9a-fA-F]{4}:[0-9a-fA-F]{2}:[0-9a-fA-F]{2}\.[0-7]$";

fn check_address(address: &str) -> Result<(), Error> {
    let re = Regex::new(PCI_ADDRESS_PATTERN)?;
    if !re.is_match(address) {
        bail!("Invalid PCI address '{address}'");
    }
    Ok(())
}

fn device_dir(sysfs_root: &Path, address: &str) -> PathBuf {
    sysfs_root.join("bus/pci/devices").join(address)
}

/// Checks whether the device at `address` is currently visible.
pub fn is_present(sysfs_root: impl AsRef<Path>, address: &str) -> Result<bool, Error> {
    check_address(address)?;
    Ok(device_dir(sysfs_root.as_ref(), address).exists())
}

/// Removes the device at `address` from the PCI bus. A device that is already
/// gone is left alone. Returns whether a removal was requested.
pub fn remove(sysfs_root: impl AsRef<Path>, address: &str) -> Result<bool, Error> {
    let sysfs_root = sysfs_root.as_ref();
    if !is_present(sysfs_root, address)? {
        debug!("PCI device '{address}' is not present, nothing to remove");
        return Ok(false);
    }

    info!("Removing PCI device '{address}'");
    files::write_attribute(device_dir(sysfs_root, address).join("remove"), "1")
        .context(format!("Failed to remove PCI device '{address}'"))?;
    Ok(true)
}

/// Rescans the PCI bus, restoring removed devices.
pub fn rescan(sysfs_root: impl AsRef<Path>) -> Result<(), Error> {
    info!("Rescanning PCI bus");
    files::write_attribute(sysfs_root.as_ref().join("bus/pci/rescan"), "1")
        .context("Failed to rescan PCI bus")
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::{tempdir, TempDir};

    /// Builds a fake sysfs with the given devices.
    fn fake_sysfs(addresses: &[&str]) -> TempDir {
        let root = tempdir().unwrap();
        let bus = root.path().join("bus/pci");
        std::fs::create_dir_all(bus.join("devices")).unwrap();
        std::fs::write(bus.join("rescan"), "").unwrap();
        for address in addresses {
            let dir = bus.join("devices").join(address);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("remove"), "").unwrap();
        }
        root
    }

    #[test]
    fn test_check_address() {
        check_address("0000:04:00.0").unwrap();
        check_address("abcd:ef:1f.7").unwrap();
        check_address("04:00.0").unwrap_err();
        check_address("0000:04:00.8").unwrap_err();
        check_address("../../etc").unwrap_err();
    }

    #[test]
    fn test_remove() {
        let sysfs = fake_sysfs(&["0000:04:00.0"]);
        assert!(is_present(sysfs.path(), "0000:04:00.0").unwrap());

        assert!(remove(sysfs.path(), "0000:04:00.0").unwrap());
        let attr = sysfs.path().join("bus/pci/devices/0000:04:00.0/remove");
        assert_eq!(std::fs::read_to_string(attr).unwrap(), "1");
    }

    #[test]
    fn test_remove_absent_device() {
        let sysfs = fake_sysfs(&[]);
        assert!(!is_present(sysfs.path(), "0000:05:00.0").unwrap());
        assert!(!remove(sysfs.path(), "0000:05:00.0").unwrap());
        assert!(!remove(sysfs.path(), "0000:05:00.0").unwrap());
    }

    #[test]
    fn test_remove_rejects_bad_address() {
        let sysfs = fake_sysfs(&[]);
        remove(sysfs.path(), "not-an-address").unwrap_err();
    }

    #[test]
    fn test_rescan() {
        let sysfs = fake_sysfs(&[]);
        rescan(sysfs.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(sysfs.path().join("bus/pci/rescan")).unwrap(),
            "1"
        );

        let empty = tempdir().unwrap();
        rescan(empty.path()).unwrap_err();
    }
}
