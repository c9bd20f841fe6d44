use serde::{Deserialize, Serialize};

pub mod multilog;
pub mod scenario_log;

/// One line of a scenario log.
#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    pub level: Level,
    pub message: String,
    pub target: String,
    pub module: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl From<log::Level> for Level {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Trace,
        }
    }
}

impl From<&log::Record<'_>> for LogEntry {
    fn from(value: &log::Record) -> Self {
        Self {
            level: value.level().into(),
            message: value.args().to_string(),
            target: value.target().to_string(),
            module: value.module_path().unwrap_or_default().to_string(),
            file: value.file().unwrap_or_default().to_string(),
            line: value.line().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_serialization() {
        let entry = LogEntry::from(
            &log::Record::builder()
                .args(format_args!("Injecting fault on 'unvme-ns-0'"))
                .level(log::Level::Warn)
                .target("arraycheck::scenario::runner")
                .module_path(Some("arraycheck::scenario::runner"))
                .file(Some("src/scenario/runner.rs"))
                .line(Some(7))
                .build(),
        );

        assert_eq!(entry.level, Level::Warn);
        assert_eq!(entry.line, 7);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warn");
        assert_eq!(json["message"], "Injecting fault on 'unvme-ns-0'");
        assert_eq!(json["target"], "arraycheck::scenario::runner");
    }
}
