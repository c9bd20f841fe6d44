//! Harness configuration.
//!
//! The configuration names the array under test, the devices it is built from,
//! where the array management CLI lives and how long to wait for the host to
//! settle after each fault is injected. Everything has a default so that a
//! missing configuration file still produces the reference lab setup.

use std::{collections::HashSet, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ARRAY_NAME, DEFAULT_CLI_BINARY, DEFAULT_DETACH_SETTLE_MS, DEFAULT_RESCAN_SETTLE_MS,
    DEFAULT_RESULT_DIR, DEFAULT_SERVICE_PROCESS, DEFAULT_SYSFS_ROOT,
};

/// Static validation errors for the harness configuration.
#[derive(thiserror::Error, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidHarnessConfigurationError {
    #[error("Array name must not be empty")]
    EmptyArrayName,

    #[error("Array '{array}' must declare at least one data device")]
    NoDataDevices { array: String },

    #[error("Device '{device}' is declared more than once")]
    DuplicateDevice { device: String },

    #[error("Device name must not be empty")]
    EmptyDeviceName,

    #[error("Data device '{device}' must declare a PCI address so it can be detached")]
    MissingPciAddress { device: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HarnessConfig {
    /// Name or path of the array management CLI binary.
    #[serde(default = "default_cli")]
    pub cli: PathBuf,

    /// Name of the array service process, terminated during cleanup.
    #[serde(default = "default_service_process")]
    pub service_process: String,

    /// Directory holding one result artifact per scenario.
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Mount point of sysfs, used for PCI detach and rescan.
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,

    #[serde(default)]
    pub settle: SettleDelays,

    #[serde(default)]
    pub array: ArrayConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cli: default_cli(),
            service_process: default_service_process(),
            result_dir: default_result_dir(),
            sysfs_root: default_sysfs_root(),
            settle: SettleDelays::default(),
            array: ArrayConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), InvalidHarnessConfigurationError> {
        self.array.validate()
    }
}

/// Fixed waits applied after host topology changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettleDelays {
    /// Milliseconds to wait after each device detach.
    #[serde(default = "default_detach_ms")]
    pub detach_ms: u64,

    /// Milliseconds to wait after a PCI rescan.
    #[serde(default = "default_rescan_ms")]
    pub rescan_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            detach_ms: DEFAULT_DETACH_SETTLE_MS,
            rescan_ms: DEFAULT_RESCAN_SETTLE_MS,
        }
    }
}

impl SettleDelays {
    pub fn detach(&self) -> Duration {
        Duration::from_millis(self.detach_ms)
    }

    pub fn rescan(&self) -> Duration {
        Duration::from_millis(self.rescan_ms)
    }

    /// Delays that never sleep, for tests.
    pub fn none() -> Self {
        Self {
            detach_ms: 0,
            rescan_ms: 0,
        }
    }
}

/// A device as seen by the array management CLI, optionally mapped to the
/// PCI function backing it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,

    /// PCI address (e.g. `0000:04:00.0`). Devices without one cannot be
    /// detached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_address: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArrayConfig {
    pub name: String,

    /// Write buffer device passed to array creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<String>,

    /// RAID type passed to array creation; the CLI default is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raid_type: Option<String>,

    pub data_devices: Vec<DeviceConfig>,

    #[serde(default)]
    pub spare_devices: Vec<DeviceConfig>,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ARRAY_NAME.into(),
            buffer: Some("uram0".into()),
            raid_type: None,
            data_devices: vec![
                DeviceConfig {
                    name: "unvme-ns-0".into(),
                    pci_address: Some("0000:04:00.0".into()),
                },
                DeviceConfig {
                    name: "unvme-ns-1".into(),
                    pci_address: Some("0000:05:00.0".into()),
                },
            ],
            spare_devices: Vec::new(),
        }
    }
}

impl ArrayConfig {
    pub fn validate(&self) -> Result<(), InvalidHarnessConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(InvalidHarnessConfigurationError::EmptyArrayName);
        }

        if self.data_devices.is_empty() {
            return Err(InvalidHarnessConfigurationError::NoDataDevices {
                array: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for device in self.data_devices.iter().chain(self.spare_devices.iter()) {
            if device.name.trim().is_empty() {
                return Err(InvalidHarnessConfigurationError::EmptyDeviceName);
            }
            if !seen.insert(device.name.as_str()) {
                return Err(InvalidHarnessConfigurationError::DuplicateDevice {
                    device: device.name.clone(),
                });
            }
        }

        if let Some(device) = self
            .data_devices
            .iter()
            .find(|device| device.pci_address.is_none())
        {
            return Err(InvalidHarnessConfigurationError::MissingPciAddress {
                device: device.name.clone(),
            });
        }

        Ok(())
    }
}

fn default_cli() -> PathBuf {
    DEFAULT_CLI_BINARY.into()
}

fn default_service_process() -> String {
    DEFAULT_SERVICE_PROCESS.into()
}

fn default_result_dir() -> PathBuf {
    DEFAULT_RESULT_DIR.into()
}

fn default_sysfs_root() -> PathBuf {
    DEFAULT_SYSFS_ROOT.into()
}

fn default_detach_ms() -> u64 {
    DEFAULT_DETACH_SETTLE_MS
}

fn default_rescan_ms() -> u64 {
    DEFAULT_RESCAN_SETTLE_MS
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = indoc! {r#"
            cli: /usr/local/bin/poseidonos-cli
            serviceProcess: poseidonos
            resultDir: /tmp/results
            sysfsRoot: /sys
            settle:
              detachMs: 250
              rescanMs: 2000
            array:
              name: POSArray2
              buffer: uram1
              raidType: RAID5
              dataDevices:
                - name: unvme-ns-0
                  pciAddress: "0000:04:00.0"
                - name: unvme-ns-1
                  pciAddress: "0000:05:00.0"
                - name: unvme-ns-2
                  pciAddress: "0000:06:00.0"
              spareDevices:
                - name: unvme-ns-3
        "#};

        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cli, PathBuf::from("/usr/local/bin/poseidonos-cli"));
        assert_eq!(config.settle.detach(), Duration::from_millis(250));
        assert_eq!(config.settle.rescan(), Duration::from_millis(2000));
        assert_eq!(config.array.name, "POSArray2");
        assert_eq!(config.array.raid_type.as_deref(), Some("RAID5"));
        assert_eq!(config.array.data_devices.len(), 3);
        assert_eq!(
            config.array.data_devices[2].pci_address.as_deref(),
            Some("0000:06:00.0")
        );
        assert_eq!(config.array.spare_devices[0].name, "unvme-ns-3");
        assert_eq!(config.array.spare_devices[0].pci_address, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: HarnessConfig = serde_yaml::from_str("resultDir: /tmp/x\n").unwrap();
        assert_eq!(config.result_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.cli, PathBuf::from(DEFAULT_CLI_BINARY));
        assert_eq!(config.settle.detach_ms, DEFAULT_DETACH_SETTLE_MS);
        assert_eq!(SettleDelays::default().detach_ms, 100);
        assert_eq!(SettleDelays::default().detach(), Duration::from_millis(100));
        assert_eq!(config.array, ArrayConfig::default());
        assert_eq!(config.array.name, "POSArray1");
        assert_eq!(config.array.data_devices.len(), 2);
        assert!(config.array.spare_devices.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        serde_yaml::from_str::<HarnessConfig>("resultDirectory: /tmp/x\n").unwrap_err();
    }

    #[test]
    fn test_validate() {
        let mut array = ArrayConfig::default();
        array.validate().unwrap();

        array.name = " ".into();
        assert_eq!(
            array.validate().unwrap_err(),
            InvalidHarnessConfigurationError::EmptyArrayName
        );

        let mut array = ArrayConfig {
            data_devices: Vec::new(),
            ..Default::default()
        };
        assert_eq!(
            array.validate().unwrap_err(),
            InvalidHarnessConfigurationError::NoDataDevices {
                array: "POSArray1".into()
            }
        );

        array.data_devices = ArrayConfig::default().data_devices;
        array.spare_devices = vec![array.data_devices[1].clone()];
        assert_eq!(
            array.validate().unwrap_err(),
            InvalidHarnessConfigurationError::DuplicateDevice {
                device: "unvme-ns-1".into()
            }
        );
    }

    #[test]
    fn test_data_device_needs_pci_address() {
        let mut array = ArrayConfig::default();
        array.data_devices[1].pci_address = None;
        assert_eq!(
            array.validate().unwrap_err(),
            InvalidHarnessConfigurationError::MissingPciAddress {
                device: "unvme-ns-1".into()
            }
        );

        // Spares are never detached.
        let array = ArrayConfig {
            spare_devices: vec![DeviceConfig {
                name: "unvme-ns-2".into(),
                pci_address: None,
            }],
            ..Default::default()
        };
        array.validate().unwrap();
    }
}
