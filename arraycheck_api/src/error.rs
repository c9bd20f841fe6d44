use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::config::InvalidHarnessConfigurationError;

/// User provided input was invalid.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to load harness configuration file from '{path}'")]
    LoadConfiguration { path: String },
    #[error("Failed to parse harness configuration")]
    ParseConfiguration,
    #[error("Invalid harness configuration: {0}")]
    InvalidConfiguration(#[from] InvalidHarnessConfigurationError),
    #[error("Unknown scenario '{id}'")]
    UnknownScenario { id: String },
    #[error("Operation '{operation}' is missing required argument '{argument}'")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },
}

/// Running an external command, most importantly the array management CLI,
/// failed. These errors are fatal to the scenario and are recorded as a failed
/// verdict.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationError {
    #[error("Failed to invoke '{binary}' for operation '{operation}'")]
    CliInvocation {
        binary: String,
        operation: &'static str,
    },
    #[error("Malformed response to '{operation}': {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },
}

/// Changing host device visibility or the array service failed.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceControlError {
    #[error("Failed to detach device '{device}'")]
    Detach { device: String },
    #[error("Failed to rescan PCI bus")]
    Rescan,
    #[error("Failed to terminate process '{process}'")]
    TerminateService { process: String },
    #[error("Device '{device}' is not a member of array '{array}'")]
    NotArrayMember { device: String, array: String },
}

#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingError {
    #[error("Failed to clear result artifact '{path}'")]
    Clear { path: String },
    #[error("Failed to write result artifact '{path}'")]
    Write { path: String },
    #[error("Verdict for scenario '{id}' was already recorded")]
    AlreadyRecorded { id: String },
}

#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalError {
    #[error("Failed to serialize configuration")]
    SerializeConfiguration,
}

/// Each variant of `ErrorKind` corresponds to a different category of error.
#[derive(Debug, Eq, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// The harness was given invalid configuration or arguments.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// The array management CLI could not be invoked or answered with
    /// something that is not a response.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// Fault injection or environment cleanup failed.
    #[error(transparent)]
    DeviceControl(#[from] DeviceControlError),

    /// The verdict artifact could not be cleared or written.
    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// A bug in the harness.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct HarnessErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct HarnessError(Box<HarnessErrorInner>);
impl HarnessError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        HarnessError(Box::new(HarnessErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    #[track_caller]
    pub fn with_source(kind: impl Into<ErrorKind>, source: anyhow::Error) -> Self {
        HarnessError(Box::new(HarnessErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: Some(source),
            context: Vec::new(),
        }))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured HarnessError.
    fn structured(self, kind: K) -> Result<T, HarnessError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, HarnessError> {
        match self {
            Some(t) => Ok(t),
            None => Err(HarnessError::new(kind)),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, HarnessError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(HarnessError::with_source(kind, e.into())),
        }
    }
}

pub trait HarnessResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, HarnessError>;
}

impl<T> HarnessResultExt<T> for Result<T, HarnessError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, HarnessError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Serialize for HarnessError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("harness-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Invocation(ref e) => state.serialize_field("error", e)?,
            ErrorKind::DeviceControl(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Recording(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Internal(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{e:?}")))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{i: >5}: ")?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{index: >5}: ")?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_yaml::Value;

    use super::*;

    #[test]
    fn test_error_serialize() {
        let e = std::fs::read("/non-existant-file")
            .context("failed to read file")
            .structured(InvalidInputError::LoadConfiguration {
                path: "/non-existant-file".into(),
            })
            .unwrap_err();
        match serde_yaml::to_value(e).unwrap() {
            Value::Mapping(m) => {
                assert_eq!(m.len(), 5);
                assert_eq!(m["category"], Value::String("invalid-input".into()));
                assert!(matches!(m["cause"], Value::String(_)));
                assert_eq!(
                    m["message"],
                    Value::String(
                        "Failed to load harness configuration file from '/non-existant-file'"
                            .into()
                    )
                );
                match m["location"] {
                    Value::String(ref s) => assert!(s.contains("error.rs:")),
                    _ => panic!("location isn't string"),
                }
            }
            _ => panic!("value isn't mapping"),
        }
    }

    #[test]
    fn test_error_debug() {
        let error = Err::<(), _>(anyhow::anyhow!("z"))
            .context("x\ny")
            .structured(InternalError::SerializeConfiguration)
            .unwrap_err();
        assert_eq!(
            format!("{error:?}"),
            format!(
                "Failed to serialize configuration at {}:{}\n\nCaused by:\n    0: x\n       y\n    1: z\n",
                error.0.location.file(),
                error.0.location.line(),
            ),
        );
    }

    #[test]
    fn test_message_context() {
        let error = Err::<(), _>(HarnessError::new(RecordingError::Write {
            path: "/tmp/x.result".into(),
        }))
        .message("Failed to record verdict")
        .unwrap_err();

        assert!(matches!(
            error.kind(),
            ErrorKind::Recording(RecordingError::Write { .. })
        ));
        let rendered = format!("{error:?}");
        assert!(rendered.contains("Context:"));
        assert!(rendered.contains("    0: Failed to record verdict at"));
    }

    #[test]
    fn test_option_structured() {
        let error = None::<u32>
            .structured(InvocationError::MalformedResponse {
                operation: "mount_array",
                reason: "missing 'result.status.code'".into(),
            })
            .unwrap_err();
        assert_eq!(
            error.kind(),
            &ErrorKind::Invocation(InvocationError::MalformedResponse {
                operation: "mount_array",
                reason: "missing 'result.status.code'".into(),
            })
        );
        assert_eq!(<&str>::from(error.kind()), "invocation");
    }
}
