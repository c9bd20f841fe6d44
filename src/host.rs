//! Host side collaborators: device visibility and the array service process.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    thread,
};

use log::{debug, info, warn};

use arraycheck_api::{
    config::{DeviceConfig, SettleDelays},
    error::{DeviceControlError, HarnessError, HarnessResultExt, ReportError},
};
use osutils::{pci, process};

use crate::scenario::DeviceRef;

/// Changes which devices the host can see.
pub trait DeviceControl {
    /// Makes `device` disappear from the host and waits for the topology to
    /// settle. Detaching a device that is already gone, or that this control
    /// does not know, does nothing. A known device that cannot be detached is
    /// an error.
    fn detach(&self, device: &DeviceRef) -> Result<(), HarnessError>;

    /// Restores every detached device.
    fn rescan(&self) -> Result<(), HarnessError>;
}

/// Terminates the array service.
pub trait ServiceControl {
    fn terminate(&self) -> Result<(), HarnessError>;
}

/// Detaches devices by removing their PCI function through sysfs.
pub struct SysfsDeviceControl {
    sysfs_root: PathBuf,
    /// PCI address of every declared device, `None` when it has none.
    addresses: HashMap<String, Option<String>>,
    settle: SettleDelays,
}

impl SysfsDeviceControl {
    pub fn new<'a>(
        sysfs_root: impl AsRef<Path>,
        devices: impl IntoIterator<Item = &'a DeviceConfig>,
        settle: SettleDelays,
    ) -> Self {
        Self {
            sysfs_root: sysfs_root.as_ref().to_path_buf(),
            addresses: devices
                .into_iter()
                .map(|device| (device.name.clone(), device.pci_address.clone()))
                .collect(),
            settle,
        }
    }
}

impl DeviceControl for SysfsDeviceControl {
    fn detach(&self, device: &DeviceRef) -> Result<(), HarnessError> {
        let detach_error = || DeviceControlError::Detach {
            device: device.identifier().into(),
        };

        match self.addresses.get(device.identifier()) {
            Some(Some(address)) => {
                let removed = pci::remove(&self.sysfs_root, address).structured(detach_error())?;
                if !removed {
                    debug!("Device '{device}' ({address}) was already detached");
                }
            }
            Some(None) => {
                return Err(HarnessError::new(detach_error()))
                    .message(format!("Device '{device}' has no PCI address"));
            }
            None => warn!("Device '{device}' is not declared, not detaching it"),
        }

        debug!("Settling for {:?} after detaching '{device}'", self.settle.detach());
        thread::sleep(self.settle.detach());
        Ok(())
    }

    fn rescan(&self) -> Result<(), HarnessError> {
        pci::rescan(&self.sysfs_root).structured(DeviceControlError::Rescan)?;
        thread::sleep(self.settle.rescan());
        Ok(())
    }
}

/// Kills the array service process by name.
pub struct ProcessServiceControl {
    process: String,
}

impl ProcessServiceControl {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
        }
    }
}

impl ServiceControl for ProcessServiceControl {
    fn terminate(&self) -> Result<(), HarnessError> {
        let killed = process::kill_by_name(&self.process).structured(
            DeviceControlError::TerminateService {
                process: self.process.clone(),
            },
        )?;
        if killed {
            info!("Terminated '{}'", self.process);
        } else {
            debug!("'{}' was not running", self.process);
        }
        Ok(())
    }
}
