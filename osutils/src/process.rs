use anyhow::{bail, Context, Error};
use log::{debug, info};

use crate::dependencies::Dependency;

/// Sends SIGKILL to every process whose name is exactly `name`. Returns
/// whether any process matched.
pub fn kill_by_name(name: &str) -> Result<bool, Error> {
    if name.is_empty() {
        bail!("Process name must not be empty");
    }

    info!("Killing process '{name}'");
    let output = Dependency::Pkill
        .cmd()
        .args(["--signal", "KILL", "--exact", name])
        .output()
        .context(format!("Failed to run pkill for '{name}'"))?;

    // pkill exits with 1 when nothing matched.
    match output.code() {
        Some(0) => Ok(true),
        Some(1) => {
            debug!("No process named '{name}' was running");
            Ok(false)
        }
        _ => output
            .check()
            .map(|()| true)
            .context(format!("Failed to kill process '{name}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_missing_process() {
        if which::which(Dependency::Pkill.name()).is_err() {
            return;
        }
        assert!(!kill_by_name("nosuchproc42").unwrap());
    }

    #[test]
    fn test_kill_empty_name() {
        kill_by_name("").unwrap_err();
    }
}
