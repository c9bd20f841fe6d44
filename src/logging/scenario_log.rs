use std::{
    fs::File,
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use log::{LevelFilter, Log, Metadata, Record};

use osutils::files;

use super::LogEntry;

type Target = Arc<Mutex<Option<File>>>;

/// JSON-lines log of the scenario currently running. Records arriving while
/// no scenario is running are dropped.
pub struct ScenarioLog {
    target: Target,
    max_level: LevelFilter,
}

/// Switches the file a [`ScenarioLog`] writes to, after the logger itself
/// has been handed to the global logger.
#[derive(Clone)]
pub struct ScenarioLogHandle {
    target: Target,
}

impl ScenarioLog {
    pub fn new() -> (Self, ScenarioLogHandle) {
        let target = Target::default();
        (
            Self {
                target: target.clone(),
                max_level: LevelFilter::Trace,
            },
            ScenarioLogHandle { target },
        )
    }

    pub fn with_max_level(self, max_level: LevelFilter) -> Self {
        Self { max_level, ..self }
    }

    pub fn into_logger(self) -> Box<dyn Log> {
        Box::new(self)
    }

    /// Best effort attempt to write the log entry to the file
    fn write_entry(&self, record: &Record) -> Result<(), Box<dyn std::error::Error + '_>> {
        let mut target = self.target.lock()?;
        if let Some(file) = target.as_mut() {
            let mut serialized = serde_json::to_string(&LogEntry::from(record))?;
            serialized.push('\n');
            file.write_all(serialized.as_bytes())?;
        }

        Ok(())
    }
}

impl ScenarioLogHandle {
    /// Starts a fresh log at `path`, truncating what a previous run left.
    /// On failure the log is detached and the error returned.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        let file = files::create_file(path.as_ref());
        let mut target = self
            .target
            .lock()
            .map_err(|_| anyhow::anyhow!("Scenario log lock poisoned"))?;
        match file {
            Ok(file) => {
                *target = Some(file);
                Ok(())
            }
            Err(e) => {
                *target = None;
                Err(e)
            }
        }
    }

    /// Stops writing to the current file.
    pub fn close(&self) {
        if let Ok(mut target) = self.target.lock() {
            if let Some(mut file) = target.take() {
                let _ = file.flush();
            }
        }
    }
}

impl Log for ScenarioLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        let _ = self.write_entry(record);
    }

    fn flush(&self) {
        if let Ok(mut target) = self.target.lock() {
            if let Some(file) = target.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
