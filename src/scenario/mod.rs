use std::fmt::{Display, Formatter, Result as FmtResult};

use arraycheck_api::{
    config::{ArrayConfig, DeviceConfig},
    error::{DeviceControlError, HarnessError, InvalidInputError},
};

use crate::expectation::{CodeExpectation, StateExpectation};

pub mod fixtures;
pub mod runner;

/// Opaque handle to a device, shared by the fixture that builds the array
/// and the faults that detach its members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    identifier: String,
}

impl DeviceRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl Display for DeviceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.identifier)
    }
}

/// Per-run state built by a fixture and handed to every later stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    pub scenario_id: String,
    pub array_name: String,
    pub data_devices: Vec<DeviceRef>,
    pub spare_devices: Vec<DeviceRef>,
}

impl ScenarioContext {
    pub fn new(scenario_id: &str, array: &ArrayConfig, with_spares: bool) -> Self {
        let refs = |devices: &[DeviceConfig]| -> Vec<DeviceRef> {
            devices
                .iter()
                .map(|device| DeviceRef::new(device.name.as_str()))
                .collect()
        };

        Self {
            scenario_id: scenario_id.into(),
            array_name: array.name.clone(),
            data_devices: refs(&array.data_devices),
            spare_devices: if with_spares {
                refs(&array.spare_devices)
            } else {
                Vec::new()
            },
        }
    }

    /// Whether `device` was declared as part of the array under test.
    pub fn is_member(&self, device: &DeviceRef) -> bool {
        self.data_devices
            .iter()
            .chain(self.spare_devices.iter())
            .any(|member| member == device)
    }

    /// Resolves a fault target to a member device.
    pub fn resolve(&self, fault: &Fault) -> Result<DeviceRef, HarnessError> {
        let Fault::DetachDataDevice(index) = fault;
        self.data_devices.get(*index).cloned().ok_or_else(|| {
            HarnessError::new(DeviceControlError::NotArrayMember {
                device: format!("data device #{}", index + 1),
                array: self.array_name.clone(),
            })
        })
    }
}

/// Reusable setup a scenario starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    /// Devices scanned and the array created from its data devices only.
    ArrayNoSpare,
}

/// A fault injected after the fixture and before the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Detach the n-th (zero based) data device of the array.
    DetachDataDevice(usize),
}

/// The action whose outcome the scenario judges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MountArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: &'static str,
    pub description: &'static str,
    pub fixture: Fixture,
    pub faults: Vec<Fault>,
    pub action: Action,
    pub expected_code: CodeExpectation,
    pub expected_state: StateExpectation,
}

/// Every scenario the harness knows, in run order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "mount-array-broken-in-offline",
            description: "Mounting an array after two of its data devices were detached is rejected and the array is not online",
            fixture: Fixture::ArrayNoSpare,
            faults: vec![Fault::DetachDataDevice(0), Fault::DetachDataDevice(1)],
            action: Action::MountArray,
            expected_code: CodeExpectation::Rejected,
            expected_state: StateExpectation::NotOnline,
        },
        Scenario {
            id: "mount-array-no-spare",
            description: "An array created without spares mounts and comes online",
            fixture: Fixture::ArrayNoSpare,
            faults: Vec::new(),
            action: Action::MountArray,
            expected_code: CodeExpectation::Accepted,
            expected_state: StateExpectation::Online,
        },
    ]
}

/// Looks a scenario up by id.
pub fn find(id: &str) -> Result<Scenario, HarnessError> {
    catalog()
        .into_iter()
        .find(|scenario| scenario.id == id)
        .ok_or_else(|| HarnessError::new(InvalidInputError::UnknownScenario { id: id.into() }))
}
