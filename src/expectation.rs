//! Turning responses and array state into a verdict.
//!
//! A scenario is judged in two stages. The triggering action's response code
//! is checked first; only when that passes is the array state fetched again
//! and checked. Both stages must pass.

use std::fmt::{Formatter, Result as FmtResult};

use log::{debug, info};
use strum_macros::{Display, IntoStaticStr};

use arraycheck_api::{constants::INVOCATION_FAILURE_CODE, error::HarnessError};

use crate::response::{ArrayInfo, ArrayState, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    fn from_bool(passed: bool) -> Self {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

/// Passes iff the action was rejected, i.e. `code` is non-zero.
pub fn expect_false(code: i64) -> Outcome {
    Outcome::from_bool(code != 0)
}

/// Passes iff the action succeeded, i.e. `code` is zero.
pub fn expect_true(code: i64) -> Outcome {
    Outcome::from_bool(code == 0)
}

/// What the triggering action's response code must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeExpectation {
    Rejected,
    Accepted,
}

impl CodeExpectation {
    pub fn check(&self, code: i64) -> Outcome {
        match self {
            CodeExpectation::Rejected => expect_false(code),
            CodeExpectation::Accepted => expect_true(code),
        }
    }
}

/// What the array state must look like once the action completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateExpectation {
    /// Anything but online, including unknown.
    NotOnline,
    Online,
}

impl StateExpectation {
    pub fn check(&self, state: ArrayState) -> Outcome {
        match self {
            StateExpectation::NotOnline => Outcome::from_bool(state != ArrayState::Online),
            StateExpectation::Online => Outcome::from_bool(state == ArrayState::Online),
        }
    }
}

/// Why a verdict came out the way it did. Not part of the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Satisfied,
    UnexpectedCode,
    UnexpectedState(ArrayState),
    /// A setup step was rejected by the CLI.
    FixtureRejected(&'static str),
    /// The harness itself failed; holds the error category.
    HarnessFailure(&'static str),
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Reason::Satisfied => f.write_str("all expectations met"),
            Reason::UnexpectedCode => f.write_str("unexpected response code"),
            Reason::UnexpectedState(state) => write!(f, "unexpected array state '{state}'"),
            Reason::FixtureRejected(operation) => write!(f, "fixture step '{operation}' rejected"),
            Reason::HarnessFailure(category) => write!(f, "harness error ({category})"),
        }
    }
}

/// The judgment of one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub code: i64,
    pub detail: String,
    pub reason: Reason,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// A failed verdict for a rejected setup step, carrying its payload.
    pub fn fixture_rejected(operation: &'static str, response: &Response) -> Self {
        Verdict {
            outcome: Outcome::Fail,
            code: response.code,
            detail: response.raw_text.clone(),
            reason: Reason::FixtureRejected(operation),
        }
    }

    /// A failed verdict for a run the harness could not complete.
    pub fn from_error(error: &HarnessError) -> Self {
        Verdict {
            outcome: Outcome::Fail,
            code: INVOCATION_FAILURE_CODE,
            detail: format!("{error:?}"),
            reason: Reason::HarnessFailure(error.kind().into()),
        }
    }

    /// Renders the artifact body: `"<pass|fail> (<code>)\n<detail>"`.
    pub fn render(&self) -> String {
        format!("{} ({})\n{}", self.outcome, self.code, self.detail)
    }
}

/// Judges an action response. `refetch` is only called when the code check
/// passes, and its payload then becomes the verdict detail.
pub fn judge<F>(
    expected_code: CodeExpectation,
    expected_state: StateExpectation,
    action: &Response,
    refetch: F,
) -> Result<Verdict, HarnessError>
where
    F: FnOnce() -> Result<ArrayInfo, HarnessError>,
{
    let code = action.code;
    if expected_code.check(code) == Outcome::Fail {
        info!("Response code {code} does not match {expected_code:?}");
        return Ok(Verdict {
            outcome: Outcome::Fail,
            code,
            detail: action.raw_text.clone(),
            reason: Reason::UnexpectedCode,
        });
    }

    debug!("Response code {code} matches {expected_code:?}, checking array state");
    let info = refetch()?;
    let outcome = expected_state.check(info.state);
    info!(
        "Array '{}' is {}, expected {expected_state:?}: {outcome}",
        info.name, info.state
    );

    Ok(Verdict {
        outcome,
        code,
        detail: info.raw,
        reason: match outcome {
            Outcome::Pass => Reason::Satisfied,
            Outcome::Fail => Reason::UnexpectedState(info.state),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use arraycheck_api::error::InvocationError;

    use super::*;

    fn response(code: i64) -> Response {
        Response {
            raw_text: format!(r#"{{"result":{{"status":{{"code":{code}}}}}}}"#),
            command: Some("MOUNTARRAY".into()),
            code,
            description: String::new(),
            data: serde_json::Value::Null,
        }
    }

    fn info(state: ArrayState) -> ArrayInfo {
        ArrayInfo {
            name: "POSArray1".into(),
            state,
            raw: format!("state={state}"),
        }
    }

    #[test]
    fn test_expect_false() {
        for code in [1, -1, 2545, i64::MAX, i64::MIN] {
            assert_eq!(expect_false(code), Outcome::Pass, "code {code}");
            assert_eq!(expect_true(code), Outcome::Fail, "code {code}");
        }
        assert_eq!(expect_false(0), Outcome::Fail);
        assert_eq!(expect_true(0), Outcome::Pass);
    }

    #[test]
    fn test_state_expectation() {
        assert_eq!(
            StateExpectation::NotOnline.check(ArrayState::Online),
            Outcome::Fail
        );
        for state in [
            ArrayState::Offline,
            ArrayState::Degraded,
            ArrayState::Unknown,
        ] {
            assert_eq!(StateExpectation::NotOnline.check(state), Outcome::Pass);
            assert_eq!(StateExpectation::Online.check(state), Outcome::Fail);
        }
    }

    #[test]
    fn test_judge_pass_uses_state_detail() {
        let verdict = judge(
            CodeExpectation::Rejected,
            StateExpectation::NotOnline,
            &response(2545),
            || Ok(info(ArrayState::Offline)),
        )
        .unwrap();

        assert!(verdict.passed());
        assert_eq!(verdict.code, 2545);
        assert_eq!(verdict.detail, "state=offline");
        assert_eq!(verdict.render(), "pass (2545)\nstate=offline");
    }

    #[test]
    fn test_judge_unexpected_code_short_circuits() {
        let refetched = Cell::new(false);
        let action = response(0);
        let verdict = judge(
            CodeExpectation::Rejected,
            StateExpectation::NotOnline,
            &action,
            || {
                refetched.set(true);
                Ok(info(ArrayState::Offline))
            },
        )
        .unwrap();

        assert!(!refetched.get(), "State must not be fetched");
        assert_eq!(verdict.outcome, Outcome::Fail);
        assert_eq!(verdict.reason, Reason::UnexpectedCode);
        assert!(verdict.render().starts_with("fail (0)\n"));
        assert_eq!(verdict.detail, action.raw_text);
    }

    #[test]
    fn test_judge_unexpected_state() {
        let verdict = judge(
            CodeExpectation::Rejected,
            StateExpectation::NotOnline,
            &response(2545),
            || Ok(info(ArrayState::Online)),
        )
        .unwrap();
        assert_eq!(verdict.outcome, Outcome::Fail);
        assert_eq!(verdict.reason, Reason::UnexpectedState(ArrayState::Online));
        assert_eq!(verdict.render(), "fail (2545)\nstate=online");
    }

    #[test]
    fn test_judge_accepted() {
        let verdict = judge(
            CodeExpectation::Accepted,
            StateExpectation::Online,
            &response(0),
            || Ok(info(ArrayState::Online)),
        )
        .unwrap();
        assert!(verdict.passed());
    }

    #[test]
    fn test_judge_refetch_error_propagates() {
        judge(
            CodeExpectation::Rejected,
            StateExpectation::NotOnline,
            &response(1),
            || {
                Err(HarnessError::new(InvocationError::MalformedResponse {
                    operation: "array_info",
                    reason: "output is not a JSON document".into(),
                }))
            },
        )
        .unwrap_err();
    }

    #[test]
    fn test_from_error() {
        let error = HarnessError::new(InvocationError::CliInvocation {
            binary: "poseidonos-cli".into(),
            operation: "mount_array",
        });
        let verdict = Verdict::from_error(&error);
        assert_eq!(verdict.outcome, Outcome::Fail);
        assert_eq!(verdict.code, INVOCATION_FAILURE_CODE);
        assert_eq!(verdict.reason, Reason::HarnessFailure("invocation"));
        assert!(verdict.render().starts_with(
            "fail (-1)\nFailed to invoke 'poseidonos-cli' for operation 'mount_array'"
        ));
    }
}
