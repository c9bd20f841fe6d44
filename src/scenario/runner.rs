//! Runs one scenario from a clean artifact to cleanup.
//!
//! Stages run strictly in order, each completing before the next starts:
//!
//! `Init -> FixtureReady -> FaultInjected -> ActionIssued -> CodeChecked ->
//! StateChecked -> Recorded -> Terminal`
//!
//! Any stage may jump straight to `Recorded` with a failed verdict. The
//! verdict is always recorded before cleanup, and cleanup always runs.

use log::{debug, error, info, warn};
use strum_macros::Display;

use arraycheck_api::{
    config::ArrayConfig,
    error::{DeviceControlError, HarnessError, HarnessResultExt},
};

use crate::{
    expectation::{self, Reason, Verdict},
    host::{DeviceControl, ServiceControl},
    poscli::ArrayCli,
    recorder::ResultRecorder,
};

use super::{
    fixtures::{self, FixtureOutcome},
    Action, Scenario,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    Init,
    FixtureReady,
    FaultInjected,
    ActionIssued,
    CodeChecked,
    StateChecked,
    Recorded,
    Terminal,
}

pub struct ScenarioRunner<'a> {
    cli: &'a dyn ArrayCli,
    devices: &'a dyn DeviceControl,
    service: &'a dyn ServiceControl,
    array: &'a ArrayConfig,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        cli: &'a dyn ArrayCli,
        devices: &'a dyn DeviceControl,
        service: &'a dyn ServiceControl,
        array: &'a ArrayConfig,
    ) -> Self {
        Self {
            cli,
            devices,
            service,
            array,
        }
    }

    fn enter(&self, scenario: &Scenario, stage: Stage) {
        debug!("Scenario '{}': {stage}", scenario.id);
    }

    /// Runs `scenario`, records its verdict and cleans up. Harness failures
    /// during the run become a failed verdict; only a failure to record the
    /// verdict is returned as an error.
    pub fn run(
        &self,
        scenario: &Scenario,
        recorder: &mut ResultRecorder,
    ) -> Result<Verdict, HarnessError> {
        info!("Running scenario '{}': {}", scenario.id, scenario.description);
        self.enter(scenario, Stage::Init);

        let verdict = match recorder
            .clear(scenario.id)
            .message("Failed to clear previous result")
            .and_then(|()| self.execute(scenario))
        {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("Scenario '{}' could not complete: {e:?}", scenario.id);
                Verdict::from_error(&e)
            }
        };

        let recorded = recorder
            .record(scenario.id, &verdict)
            .message(format!("Failed to record verdict of '{}'", scenario.id));
        if recorded.is_ok() {
            self.enter(scenario, Stage::Recorded);
        }

        self.cleanup();
        self.enter(scenario, Stage::Terminal);

        info!(
            "Scenario '{}' finished: {} ({})",
            scenario.id, verdict.outcome, verdict.reason
        );
        recorded.map(|()| verdict)
    }

    /// Everything between clearing the artifact and recording the verdict.
    fn execute(&self, scenario: &Scenario) -> Result<Verdict, HarnessError> {
        let context = match fixtures::prepare(scenario.fixture, scenario.id, self.cli, self.array)
            .message(format!("Failed to prepare fixture {:?}", scenario.fixture))?
        {
            FixtureOutcome::Ready(context) => context,
            FixtureOutcome::Rejected {
                operation,
                response,
            } => {
                warn!(
                    "Fixture step '{operation}' was rejected with code {}",
                    response.code
                );
                return Ok(Verdict::fixture_rejected(operation, &response));
            }
        };
        self.enter(scenario, Stage::FixtureReady);

        for fault in &scenario.faults {
            let device = context.resolve(fault)?;
            if !context.is_member(&device) {
                return Err(HarnessError::new(DeviceControlError::NotArrayMember {
                    device: device.identifier().into(),
                    array: context.array_name.clone(),
                }));
            }
            info!("Injecting fault {fault:?} on '{device}'");
            self.devices
                .detach(&device)
                .message(format!("Failed to inject fault {fault:?}"))?;
        }
        self.enter(scenario, Stage::FaultInjected);

        let response = match scenario.action {
            Action::MountArray => self.cli.mount_array(&context.array_name),
        }
        .message(format!("Failed to issue {:?}", scenario.action))?;
        self.enter(scenario, Stage::ActionIssued);

        let judged = expectation::judge(
            scenario.expected_code,
            scenario.expected_state,
            &response,
            || {
                self.enter(scenario, Stage::CodeChecked);
                self.cli.array_info(&context.array_name)
            },
        )
        .message("Failed to check array state");
        let verdict = match judged {
            Ok(verdict) => verdict,
            // The action did answer, so its code is kept in the verdict.
            Err(e) => {
                error!("Scenario '{}' could not complete: {e:?}", scenario.id);
                return Ok(Verdict {
                    code: response.code,
                    ..Verdict::from_error(&e)
                });
            }
        };
        if verdict.reason != Reason::UnexpectedCode {
            self.enter(scenario, Stage::StateChecked);
        }

        Ok(verdict)
    }

    /// Best effort: each step is attempted exactly once and failures are only
    /// logged.
    fn cleanup(&self) {
        if let Err(e) = self.service.terminate() {
            warn!("Failed to terminate array service during cleanup: {e:?}");
        }

        if let Err(e) = self.devices.rescan() {
            error!("Failed to restore device visibility during cleanup: {e:?}");
        }
    }
}
