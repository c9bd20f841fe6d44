//! Running one named scenario per invocation.
//!
//! Cleanup terminates the array service, so nothing that needs the service
//! may follow a scenario in the same process.

use log::{info, warn};

use arraycheck_api::error::HarnessError;

use crate::{
    expectation::Verdict,
    logging::scenario_log::ScenarioLogHandle,
    recorder::ResultRecorder,
    scenario::{self, runner::ScenarioRunner},
};

/// Runs the scenario named `id`, keeping its log next to its artifact when
/// `log` is given. Fails without touching the host when `id` is unknown.
pub fn run_one(
    runner: &ScenarioRunner,
    id: &str,
    recorder: &mut ResultRecorder,
    log: Option<&ScenarioLogHandle>,
) -> Result<Verdict, HarnessError> {
    let scenario = scenario::find(id)?;

    if let Some(log) = log {
        if let Err(e) = log.open(recorder.log_path(scenario.id)) {
            warn!("No log will be kept for scenario '{}': {e:?}", scenario.id);
        }
    }

    let verdict = runner.run(&scenario, recorder);
    if let Some(log) = log {
        log.close();
    }

    let verdict = verdict?;
    info!(
        "Scenario '{}' finished: {} ({})",
        scenario.id, verdict.outcome, verdict.code
    );
    Ok(verdict)
}
