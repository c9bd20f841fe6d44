use log::{info, warn};

use arraycheck_api::{config::ArrayConfig, error::HarnessError};

use crate::{
    poscli::{ArrayCli, CliRequest},
    response::Response,
};

use super::{Fixture, ScenarioContext};

/// Result of running a fixture.
#[derive(Debug)]
pub enum FixtureOutcome {
    Ready(ScenarioContext),
    /// The CLI rejected a setup step; the scenario cannot continue.
    Rejected {
        operation: &'static str,
        response: Response,
    },
}

/// Runs `fixture` for the scenario `scenario_id`.
pub fn prepare(
    fixture: Fixture,
    scenario_id: &str,
    cli: &dyn ArrayCli,
    array: &ArrayConfig,
) -> Result<FixtureOutcome, HarnessError> {
    match fixture {
        Fixture::ArrayNoSpare => create_array_no_spare(scenario_id, cli, array),
    }
}

fn create_array_no_spare(
    scenario_id: &str,
    cli: &dyn ArrayCli,
    array: &ArrayConfig,
) -> Result<FixtureOutcome, HarnessError> {
    if !array.spare_devices.is_empty() {
        warn!(
            "Ignoring {} configured spare device(s) for array '{}'",
            array.spare_devices.len(),
            array.name
        );
    }
    let context = ScenarioContext::new(scenario_id, array, false);

    let scan = cli.invoke(&CliRequest::ScanDevice)?;
    if !scan.is_success() {
        warn!("Device scan returned {}, continuing", scan.code);
    }

    let request = CliRequest::CreateArray {
        name: context.array_name.clone(),
        buffer: array.buffer.clone(),
        data_devices: context
            .data_devices
            .iter()
            .map(|device| device.identifier().to_string())
            .collect(),
        spare_devices: Vec::new(),
        raid_type: array.raid_type.clone(),
    };
    let created = cli.invoke(&request)?;
    if !created.is_success() {
        return Ok(FixtureOutcome::Rejected {
            operation: request.operation(),
            response: created,
        });
    }

    info!(
        "Created array '{}' from {} data device(s) without spares",
        context.array_name,
        context.data_devices.len()
    );
    Ok(FixtureOutcome::Ready(context))
}
