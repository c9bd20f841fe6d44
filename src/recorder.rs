//! Durable per-scenario result artifacts.
//!
//! Each scenario owns `<result_dir>/<scenario_id>.result`. The artifact is
//! cleared before the run and written once, with overwrite semantics, at the
//! end of it. Downstream reporting parses the first line, so the format
//! `"<pass|fail> (<code>)\n<detail>"` is fixed.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, info};

use arraycheck_api::{
    constants::{LOG_FILE_EXTENSION, RESULT_FILE_EXTENSION},
    error::{HarnessError, RecordingError, ReportError},
};
use osutils::files;

use crate::expectation::Verdict;

pub struct ResultRecorder {
    dir: PathBuf,
    recorded: HashSet<String>,
}

impl ResultRecorder {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            recorded: HashSet::new(),
        }
    }

    /// Location of the artifact for `scenario_id`.
    pub fn artifact_path(&self, scenario_id: &str) -> PathBuf {
        self.dir
            .join(format!("{scenario_id}.{RESULT_FILE_EXTENSION}"))
    }

    /// Location of the JSON log for `scenario_id`.
    pub fn log_path(&self, scenario_id: &str) -> PathBuf {
        self.dir.join(format!("{scenario_id}.{LOG_FILE_EXTENSION}"))
    }

    /// Removes any artifact left by a previous run and re-arms recording.
    pub fn clear(&mut self, scenario_id: &str) -> Result<(), HarnessError> {
        let path = self.artifact_path(scenario_id);
        if files::remove_file_if_exists(&path).structured(RecordingError::Clear {
            path: path.display().to_string(),
        })? {
            debug!("Removed previous result '{}'", path.display());
        }
        self.recorded.remove(scenario_id);
        Ok(())
    }

    /// Writes the verdict. Fails if a verdict was already recorded for this
    /// scenario since the last [`ResultRecorder::clear`].
    pub fn record(&mut self, scenario_id: &str, verdict: &Verdict) -> Result<(), HarnessError> {
        if self.recorded.contains(scenario_id) {
            return Err(HarnessError::new(RecordingError::AlreadyRecorded {
                id: scenario_id.into(),
            }));
        }

        let path = self.artifact_path(scenario_id);
        files::replace_file(&path, verdict.render().as_bytes()).structured(
            RecordingError::Write {
                path: path.display().to_string(),
            },
        )?;
        self.recorded.insert(scenario_id.into());

        info!(
            "Recorded '{}' ({}) for scenario '{scenario_id}' at '{}'",
            verdict.outcome,
            verdict.code,
            path.display()
        );
        Ok(())
    }
}
