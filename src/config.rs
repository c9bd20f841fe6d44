//! Loading the harness configuration.

use std::{fs, io::ErrorKind as IoErrorKind, path::Path};

use anyhow::Context;
use log::{debug, info};

use arraycheck_api::{
    config::HarnessConfig,
    error::{HarnessError, InternalError, InvalidInputError, ReportError},
};

/// Loads the configuration at `path`. A missing file yields the built-in
/// defaults; anything else that goes wrong is an error.
pub fn load(path: impl AsRef<Path>) -> Result<HarnessConfig, HarnessError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            info!(
                "No harness configuration at '{}', using defaults",
                path.display()
            );
            return Ok(HarnessConfig::default());
        }
        Err(e) => {
            return Err(e)
                .context("Failed to read configuration")
                .structured(InvalidInputError::LoadConfiguration {
                    path: path.display().to_string(),
                })
        }
    };

    let config = parse(&contents)?;
    debug!("Loaded harness configuration from '{}'", path.display());
    Ok(config)
}

/// Parses and validates a YAML configuration document.
pub fn parse(contents: &str) -> Result<HarnessConfig, HarnessError> {
    let config: HarnessConfig =
        serde_yaml::from_str(contents).structured(InvalidInputError::ParseConfiguration)?;
    config
        .validate()
        .map_err(|e| HarnessError::new(InvalidInputError::from(e)))?;
    Ok(config)
}

/// Renders the configuration as YAML.
pub fn render(config: &HarnessConfig) -> Result<String, HarnessError> {
    serde_yaml::to_string(config).structured(InternalError::SerializeConfiguration)
}
