use std::sync::Arc;
use std::time::Duration;

use patrol_core::ProbeConfig;
use patrol_engine::logger::Factory;
use patrol_engine::probes::{
    AppPushabilityProbe, AppProvider, HttpAvailabilityProbe, LogRecentProbe, LogSource, LogStreamProbe,
    APP_PUSHABILITY_DEFAULT_PERIOD, HTTP_AVAILABILITY_DEFAULT_PERIOD, LOG_RECENT_DEFAULT_PERIOD, LOG_STREAM_DEFAULT_PERIOD,
};
use patrol_engine::{Base, Configuration, Probe};

/// Builds the concrete probe named by `config.name`, along with the
/// heartbeat period it should run on: `config.heartbeat_ms` when given,
/// otherwise the probe kind's own default.
pub fn build(
    config: &ProbeConfig,
    factory: &Factory,
    base_domain: &str,
    app_provider: Arc<dyn AppProvider>,
    log_source: Arc<dyn LogSource>,
) -> anyhow::Result<(Box<dyn Probe>, Duration)> {
    let threshold = patrol_core::parse_threshold(&config.threshold)?;
    let configuration = Configuration::from_threshold(config.name.clone(), threshold)
        .map_err(|e| anyhow::anyhow!("invalid probe configuration {}: {e}", config.name))?;
    let base = Base::new(factory.new_logger(&config.name), configuration);

    let (probe, default_period): (Box<dyn Probe>, Duration) = match config.name.as_str() {
        "http-availability" => (
            Box::new(HttpAvailabilityProbe::new(base, base_domain, app_provider)),
            HTTP_AVAILABILITY_DEFAULT_PERIOD,
        ),
        "app-pushability" => (Box::new(AppPushabilityProbe::new(base, app_provider)), APP_PUSHABILITY_DEFAULT_PERIOD),
        "cf-recent-log-functionality" => (
            Box::new(LogRecentProbe::new(base, log_source, app_provider)),
            LOG_RECENT_DEFAULT_PERIOD,
        ),
        "cf-log-functionality" => (
            Box::new(LogStreamProbe::new(base, log_source, app_provider)),
            LOG_STREAM_DEFAULT_PERIOD,
        ),
        other => anyhow::bail!("unknown probe kind: {other}"),
    };

    let period = config.heartbeat_ms.map(Duration::from_millis).unwrap_or(default_period);
    Ok((probe, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrol_engine::logger::ChannelProvider;

    struct StubApp;
    impl AppProvider for StubApp {
        fn app_name(&self) -> &str {
            "sample-app"
        }
        fn push(&self, _logger: &patrol_engine::logger::Logger) -> patrol_engine::Result<()> {
            Ok(())
        }
        fn force_push(&self, _logger: &patrol_engine::logger::Logger) -> patrol_engine::Result<()> {
            Ok(())
        }
    }

    struct StubLog;
    impl LogSource for StubLog {
        fn recent_logs(&self, _app_name: &str) -> patrol_engine::Result<String> {
            Ok(String::new())
        }
        fn stream_logs(&self, _app_name: &str, _timeout: Duration) -> patrol_engine::Result<String> {
            Ok(String::new())
        }
    }

    fn deps() -> (Factory, Arc<dyn AppProvider>, Arc<dyn LogSource>) {
        (Factory::new(ChannelProvider::new(10)), Arc::new(StubApp), Arc::new(StubLog))
    }

    #[test]
    fn builds_each_known_probe_kind_with_its_default_period() {
        let (factory, app, log) = deps();
        for (name, expected) in [
            ("http-availability", HTTP_AVAILABILITY_DEFAULT_PERIOD),
            ("app-pushability", APP_PUSHABILITY_DEFAULT_PERIOD),
            ("cf-recent-log-functionality", LOG_RECENT_DEFAULT_PERIOD),
            ("cf-log-functionality", LOG_STREAM_DEFAULT_PERIOD),
        ] {
            let config = ProbeConfig {
                name: name.to_string(),
                threshold: "20%".to_string(),
                heartbeat_ms: None,
            };
            let (_, period) = build(&config, &factory, "https://apps.example.com", app.clone(), log.clone()).unwrap();
            assert_eq!(period, expected);
        }
    }

    #[test]
    fn heartbeat_override_wins_over_default() {
        let (factory, app, log) = deps();
        let config = ProbeConfig {
            name: "http-availability".to_string(),
            threshold: "0".to_string(),
            heartbeat_ms: Some(500),
        };
        let (_, period) = build(&config, &factory, "https://apps.example.com", app, log).unwrap();
        assert_eq!(period, Duration::from_millis(500));
    }

    #[test]
    fn unknown_probe_name_is_an_error() {
        let (factory, app, log) = deps();
        let config = ProbeConfig {
            name: "does-not-exist".to_string(),
            threshold: "0".to_string(),
            heartbeat_ms: None,
        };
        assert!(build(&config, &factory, "https://apps.example.com", app, log).is_err());
    }
}
