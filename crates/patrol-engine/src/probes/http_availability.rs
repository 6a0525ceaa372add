use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use super::AppProvider;
use crate::base::Base;
use crate::error::{Error, Result};
use crate::logger::LogLevel;
use crate::probe::Probe;

/// Curls against a domain on every tick. `install` rewrites the configured
/// domain to point at the sample app's own subdomain once its name is known;
/// `post_connect` deploys that sample app so there's something to curl.
pub struct HttpAvailabilityProbe {
    base: Base,
    client: reqwest::blocking::Client,
    base_domain: String,
    curl_domain: Option<String>,
    app_provider: Arc<dyn AppProvider>,
}

impl HttpAvailabilityProbe {
    pub fn new(base: Base, base_domain: impl Into<String>, app_provider: Arc<dyn AppProvider>) -> Self {
        Self::with_timeout(base, base_domain, app_provider, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base: Base,
        base_domain: impl Into<String>,
        app_provider: Arc<dyn AppProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            base,
            client: reqwest::blocking::Client::builder().timeout(timeout).build().unwrap_or_default(),
            base_domain: base_domain.into(),
            curl_domain: None,
            app_provider,
        }
    }

    fn target(&self) -> &str {
        self.curl_domain.as_deref().unwrap_or(&self.base_domain)
    }
}

impl Probe for HttpAvailabilityProbe {
    fn install(&mut self) -> Result<()> {
        let parsed = Url::parse(&self.base_domain)
            .map_err(|e| Error::Configuration(format!("could not parse url from domain {}: {e}", self.base_domain)))?;
        let host = parsed.host_str().unwrap_or_default();
        self.curl_domain = Some(format!("{}://{}.{}", parsed.scheme(), self.app_provider.app_name(), host));
        Ok(())
    }

    fn post_connect(&mut self) -> Result<()> {
        self.app_provider.push(self.base.logger())?;
        self.base.logger().write_string("post-connected http-availability probe", LogLevel::Info);
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        let target = self.target().to_string();
        let response = self
            .client
            .get(&target)
            .send()
            .map_err(|e| Error::ProbeDomain(format!("failed to curl {target}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            self.base
                .logger()
                .write_string(&format!("curl to {target} returned status {status}"), LogLevel::Error);
            return Err(Error::ProbeDomain(format!("{target} returned status code {status}")));
        }

        self.base.logger().write_string("curled successfully", LogLevel::Debug);
        Ok(())
    }

    fn base(&self) -> &Base {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::logger::{ChannelProvider, Factory};

    struct StubApp;

    impl AppProvider for StubApp {
        fn app_name(&self) -> &str {
            "sample-app"
        }
        fn push(&self, _logger: &crate::logger::Logger) -> Result<()> {
            Ok(())
        }
        fn force_push(&self, _logger: &crate::logger::Logger) -> Result<()> {
            Ok(())
        }
    }

    fn probe(domain: &str) -> HttpAvailabilityProbe {
        let factory = Factory::new(ChannelProvider::new(10));
        let base = Base::new(factory.new_logger("http"), Configuration::flat("http-availability", 0).unwrap());
        HttpAvailabilityProbe::new(base, domain, Arc::new(StubApp))
    }

    #[test]
    fn install_rewrites_domain_to_sample_app_subdomain() {
        let mut probe = probe("https://example.com");
        probe.install().unwrap();
        assert_eq!(probe.target(), "https://sample-app.example.com");
    }

    #[test]
    fn install_rejects_unparseable_domain() {
        let mut probe = probe("not a url");
        assert!(probe.install().is_err());
    }
}
