use crate::base::Base;
use crate::error::Result;

/// Four-phase lifecycle contract every measurement implements.
///
/// `install` runs once before any platform connection, `post_connect` once
/// after authentication succeeds, and `execute` once per heartbeat tick.
/// Default `install`/`post_connect` are no-ops for probes with nothing to set up.
pub trait Probe: Send + 'static {
    fn install(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self) -> Result<()>;

    fn base(&self) -> &Base;

    fn base_mut(&mut self) -> &mut Base;
}
