use std::sync::Arc;

use super::AppProvider;
use crate::base::Base;
use crate::error::Result;
use crate::logger::LogLevel;
use crate::probe::Probe;

/// Force-pushes the sample app on every tick, proving the platform still
/// accepts deploys. Install and post-connect are no-ops; unlike the other
/// probes this one IS the deploy, not a consumer of an already-deployed app.
pub struct AppPushabilityProbe {
    base: Base,
    app_provider: Arc<dyn AppProvider>,
}

impl AppPushabilityProbe {
    pub fn new(base: Base, app_provider: Arc<dyn AppProvider>) -> Self {
        Self { base, app_provider }
    }
}

impl Probe for AppPushabilityProbe {
    fn execute(&mut self) -> Result<()> {
        if let Err(e) = self.app_provider.force_push(self.base.logger()) {
            self.base.logger().write_string("could not push app to platform instance", LogLevel::Error);
            return Err(e);
        }
        self.base.logger().write_string("pushed app to platform instance", LogLevel::Debug);
        Ok(())
    }

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }
}
