//! Concrete probe implementations. Each one owns a [`crate::base::Base`] and
//! implements [`crate::probe::Probe`]; the heartbeat periods below are the
//! defaults a [`crate::pool::Pool`] uses unless a config overrides them.

mod http_availability;
mod log_recent;
mod log_stream;
mod push;

pub use http_availability::HttpAvailabilityProbe;
pub use log_recent::LogRecentProbe;
pub use log_stream::LogStreamProbe;
pub use push::AppPushabilityProbe;

use std::time::Duration;

use crate::error::Result;
use crate::logger::Logger;

pub const HTTP_AVAILABILITY_DEFAULT_PERIOD: Duration = Duration::from_secs(1);
pub const APP_PUSHABILITY_DEFAULT_PERIOD: Duration = Duration::from_secs(60);
pub const LOG_RECENT_DEFAULT_PERIOD: Duration = Duration::from_secs(10);
pub const LOG_STREAM_DEFAULT_PERIOD: Duration = Duration::from_secs(30);

/// The sample app every probe that needs live traffic pushes and curls
/// against. `force_push` redeploys even if a prior push already succeeded;
/// `push` is idempotent and only acts once.
///
/// Synchronous by design: probes run on a worker's own loop thread, not
/// inside an `.await`, so implementations that need the platform CLI shell
/// out with a blocking call rather than requiring the caller to block on a
/// future.
pub trait AppProvider: Send + Sync {
    fn app_name(&self) -> &str;
    fn push(&self, logger: &Logger) -> Result<()>;
    fn force_push(&self, logger: &Logger) -> Result<()>;
}

/// Narrow capability the log probes need from the platform CLI: fetching
/// already-emitted logs versus tailing a live stream for a bounded window.
pub trait LogSource: Send + Sync {
    fn recent_logs(&self, app_name: &str) -> Result<String>;
    fn stream_logs(&self, app_name: &str, timeout: Duration) -> Result<String>;
}

fn latest_timestamp(output: &str) -> Option<i64> {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"Timestamp\{(\d+)\}").expect("valid timestamp pattern"));
    re.captures_iter(output)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
