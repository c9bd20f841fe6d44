//! Adapter for the array management CLI.
//!
//! Each [`CliRequest`] maps to exactly one CLI invocation. The adapter never
//! retries; a non-zero response code is a normal [`Response`], only a CLI that
//! cannot be started or that prints something unparsable is an error.

use std::path::{Path, PathBuf};

use log::{debug, info};

use arraycheck_api::error::{
    HarnessError, HarnessResultExt, InvalidInputError, InvocationError, ReportError,
};
use osutils::dependencies::Dependency;

use crate::response::{self, ArrayInfo, Response};

/// The operations the harness knows how to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliRequest {
    /// Rescan the devices visible to the array service.
    ScanDevice,
    CreateArray {
        name: String,
        buffer: Option<String>,
        data_devices: Vec<String>,
        spare_devices: Vec<String>,
        raid_type: Option<String>,
    },
    MountArray {
        name: String,
    },
    ArrayInfo {
        name: String,
    },
}

impl CliRequest {
    /// Stable name of the operation, used in logs and errors.
    pub fn operation(&self) -> &'static str {
        match self {
            CliRequest::ScanDevice => "scan_device",
            CliRequest::CreateArray { .. } => "create_array",
            CliRequest::MountArray { .. } => "mount_array",
            CliRequest::ArrayInfo { .. } => "array_info",
        }
    }

    /// Checks that the request carries every argument its operation needs.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let missing = |argument| {
            Err(HarnessError::new(InvalidInputError::MissingArgument {
                operation: self.operation(),
                argument,
            }))
        };

        match self {
            CliRequest::ScanDevice => Ok(()),
            CliRequest::CreateArray {
                name, data_devices, ..
            } => {
                if name.is_empty() {
                    return missing("name");
                }
                if data_devices.is_empty() || data_devices.iter().any(String::is_empty) {
                    return missing("data_devices");
                }
                Ok(())
            }
            CliRequest::MountArray { name } | CliRequest::ArrayInfo { name } => {
                if name.is_empty() {
                    return missing("name");
                }
                Ok(())
            }
        }
    }

    /// Command line arguments for the request.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = match self {
            CliRequest::ScanDevice => vec!["device".into(), "scan".into()],
            CliRequest::CreateArray {
                name,
                buffer,
                data_devices,
                spare_devices,
                raid_type,
            } => {
                let mut args = vec![
                    "array".into(),
                    "create".into(),
                    "--array-name".into(),
                    name.clone(),
                ];
                if let Some(buffer) = buffer {
                    args.extend(["--buffer".into(), buffer.clone()]);
                }
                args.extend(["--data-devs".into(), data_devices.join(",")]);
                if !spare_devices.is_empty() {
                    args.extend(["--spare".into(), spare_devices.join(",")]);
                }
                if let Some(raid_type) = raid_type {
                    args.extend(["--raid".into(), raid_type.clone()]);
                }
                args
            }
            CliRequest::MountArray { name } => vec![
                "array".into(),
                "mount".into(),
                "--array-name".into(),
                name.clone(),
            ],
            CliRequest::ArrayInfo { name } => vec![
                "array".into(),
                "list".into(),
                "--array-name".into(),
                name.clone(),
            ],
        };
        args.push("--json-res".into());
        args
    }
}

/// Something that answers CLI requests.
pub trait ArrayCli {
    /// Performs exactly one invocation for `request`.
    fn invoke(&self, request: &CliRequest) -> Result<Response, HarnessError>;

    fn mount_array(&self, name: &str) -> Result<Response, HarnessError> {
        self.invoke(&CliRequest::MountArray { name: name.into() })
    }

    /// Queries the current state of `name`.
    fn array_info(&self, name: &str) -> Result<ArrayInfo, HarnessError> {
        let response = self.invoke(&CliRequest::ArrayInfo { name: name.into() })?;
        Ok(ArrayInfo::from_response(name, &response))
    }
}

/// Runs the real CLI binary.
pub struct PosCli {
    program: PathBuf,
}

impl PosCli {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }
}

impl ArrayCli for PosCli {
    fn invoke(&self, request: &CliRequest) -> Result<Response, HarnessError> {
        request.validate()?;
        let operation = request.operation();
        info!("Invoking '{operation}'");

        let mut cmd = Dependency::PosCli.cmd_at(&self.program);
        cmd.args(request.to_args());
        let output = cmd
            .output()
            .structured(InvocationError::CliInvocation {
                binary: self.program.to_string_lossy().into(),
                operation,
            })?;

        let stdout = output.output();
        debug!(
            "'{}' {}, stdout:\n{stdout}",
            output.rendered_command(),
            output.explain_exit()
        );

        response::parse(operation, &stdout).message(format!(
            "Unparsable output from '{}' ({}):\n{}",
            output.rendered_command(),
            output.explain_exit(),
            output.output_report()
        ))
    }
}
