use std::sync::Arc;
use std::time::Duration;

use super::{latest_timestamp, AppProvider, LogSource};
use crate::base::Base;
use crate::error::{Error, Result};
use crate::logger::LogLevel;
use crate::probe::Probe;

const STREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Tails the app's live log stream for a bounded window on every tick. A
/// timeout with no error is not itself a failure — it only fails if nothing
/// useful (a parseable timestamp, newer than the last one seen) came through
/// in that window.
pub struct LogStreamProbe {
    base: Base,
    log_source: Arc<dyn LogSource>,
    app_provider: Arc<dyn AppProvider>,
    last_timestamp: i64,
}

impl LogStreamProbe {
    pub fn new(base: Base, log_source: Arc<dyn LogSource>, app_provider: Arc<dyn AppProvider>) -> Self {
        Self {
            base,
            log_source,
            app_provider,
            last_timestamp: 0,
        }
    }
}

impl Probe for LogStreamProbe {
    fn post_connect(&mut self) -> Result<()> {
        self.app_provider.push(self.base.logger())?;
        self.base.logger().write_string("post-connected log-stream probe", LogLevel::Info);
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        let output = self
            .log_source
            .stream_logs(self.app_provider.app_name(), STREAM_TIMEOUT)
            .map_err(|e| {
                self.base.logger().write_string("could not stream logs", LogLevel::Error);
                e
            })?;

        let timestamp = latest_timestamp(&output).ok_or_else(|| {
            self.base.logger().write_string("could not find timestamp in streamed logs", LogLevel::Error);
            Error::ProbeDomain("log did not contain timestamps".into())
        })?;

        if timestamp <= self.last_timestamp {
            self.base
                .logger()
                .write_string("found timestamp is <= previous one, no new logs", LogLevel::Error);
            return Err(Error::ProbeDomain("no new logs since last stream window".into()));
        }

        self.last_timestamp = timestamp;
        self.base.logger().write_string("streamed logs successfully", LogLevel::Debug);
        Ok(())
    }

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }
}
