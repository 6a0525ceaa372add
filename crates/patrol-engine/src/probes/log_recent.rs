use std::sync::Arc;

use super::{latest_timestamp, AppProvider, LogSource};
use crate::base::Base;
use crate::error::{Error, Result};
use crate::logger::LogLevel;
use crate::probe::Probe;

/// Fetches the app's recent-log buffer on every tick and checks it advanced
/// past the last timestamp seen, proving the logging pipeline is still live.
pub struct LogRecentProbe {
    base: Base,
    log_source: Arc<dyn LogSource>,
    app_provider: Arc<dyn AppProvider>,
    last_timestamp: i64,
}

impl LogRecentProbe {
    pub fn new(base: Base, log_source: Arc<dyn LogSource>, app_provider: Arc<dyn AppProvider>) -> Self {
        Self {
            base,
            log_source,
            app_provider,
            last_timestamp: 0,
        }
    }
}

impl Probe for LogRecentProbe {
    fn post_connect(&mut self) -> Result<()> {
        self.app_provider.push(self.base.logger())?;
        self.base.logger().write_string("post-connected log-recent probe", LogLevel::Info);
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        let output = self.log_source.recent_logs(self.app_provider.app_name()).map_err(|e| {
            self.base.logger().write_string("could not fetch recent logs", LogLevel::Error);
            e
        })?;

        let timestamp = latest_timestamp(&output).ok_or_else(|| {
            self.base.logger().write_string("could not find timestamp in fetched logs", LogLevel::Error);
            Error::ProbeDomain("log did not contain timestamps".into())
        })?;

        if timestamp <= self.last_timestamp {
            self.base
                .logger()
                .write_string("found timestamp is <= previous one, no new logs", LogLevel::Error);
            return Err(Error::ProbeDomain("no new logs since last recent-log fetch".into()));
        }

        self.last_timestamp = timestamp;
        self.base.logger().write_string("fetched recent logs successfully", LogLevel::Debug);
        Ok(())
    }

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }
}
