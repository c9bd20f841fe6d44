use log::{LevelFilter, Log, Metadata, Record};

/// Fans every record out to a set of loggers.
pub struct MultiLogger {
    loggers: Vec<Box<dyn Log>>,
}

impl Default for MultiLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiLogger {
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn Log>) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Installs the logger globally. Each logger applies its own level.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(LevelFilter::Trace);
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for MultiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.loggers.iter().any(|l| l.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        self.loggers
            .iter()
            .filter(|l| l.enabled(record.metadata()))
            .for_each(|l| l.log(record));
    }

    fn flush(&self) {
        self.loggers.iter().for_each(|l| l.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use log::Level;

    #[derive(Default)]
    struct TestLogger {
        enabled: bool,
        received: Arc<AtomicUsize>,
    }

    impl Log for TestLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            self.enabled
        }

        fn log(&self, _: &Record) {
            self.received.fetch_add(1, Ordering::Relaxed);
        }

        fn flush(&self) {}
    }

    fn logger(enabled: bool) -> (Box<TestLogger>, Arc<AtomicUsize>) {
        let logger = Box::new(TestLogger {
            enabled,
            ..Default::default()
        });
        let received = logger.received.clone();
        (logger, received)
    }

    fn record(target: &str, level: Level, f: impl FnOnce(&Record)) {
        f(&Record::builder().target(target).level(level).build());
    }

    #[test]
    fn test_enabled() {
        let (logger1, _) = logger(false);
        let (logger2, _) = logger(false);
        let multi_logger = MultiLogger::new().with_logger(logger1).with_logger(logger2);
        assert!(
            !multi_logger.enabled(&Metadata::builder().level(Level::Error).build()),
            "Logger should not be enabled"
        );

        let (logger1, _) = logger(false);
        let (logger2, _) = logger(true);
        let multi_logger = MultiLogger::new().with_logger(logger1).with_logger(logger2);
        assert!(
            multi_logger.enabled(&Metadata::builder().level(Level::Error).build()),
            "Logger should be enabled"
        );
    }

    #[test]
    fn test_filter() {
        let (logger1, received1) = logger(true);
        let (logger2, received2) = logger(false);
        let multi_logger = MultiLogger::new().with_logger(logger1).with_logger(logger2);

        record("arraycheck", Level::Info, |r| multi_logger.log(r));
        record("arraycheck", Level::Trace, |r| multi_logger.log(r));

        assert_eq!(received1.load(Ordering::Relaxed), 2);
        assert_eq!(received2.load(Ordering::Relaxed), 0);
    }
}
