use crate::configuration::Configuration;
use crate::logger::Logger;
use crate::result::ResultSnapshot;

/// Per-probe mutable state: a logger handle, its failure-tolerance configuration,
/// and the run counters.
///
/// Every mutator here is `&mut self` rather than internally synchronized: the
/// owning [`crate::worker::Worker`] is the only code path that ever holds a
/// mutable reference to a probe's base, so no additional locking is needed.
pub struct Base {
    logger: Logger,
    configuration: Configuration,
    successful: u64,
    failed: u64,
}

impl Base {
    pub fn new(logger: Logger, configuration: Configuration) -> Self {
        Self {
            logger,
            configuration,
            successful: 0,
            failed: 0,
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn record_successful_run(&mut self) {
        self.successful += 1;
    }

    pub fn record_failed_run(&mut self) {
        self.failed += 1;
    }

    pub fn snapshot(&self) -> ResultSnapshot {
        let valid = self.configuration.valid_run(self.successful, self.failed);
        ResultSnapshot::new(self.successful, self.failed, valid)
    }
}
