use std::path::{Path, PathBuf};
use std::sync::Arc;

use patrol_core::{PlatformConfig, TaskConfig};
use tokio::sync::{mpsc, Mutex};

use crate::consumer::Consumer;
use crate::error::{Error, Result};
use crate::logger::{LogLevel, Logger};
use crate::platform::{PlatformCli, PlatformClient, PlatformTask};
use crate::pool::Pool;

/// Exports the sample app bundle a run's probes push and curl against, and
/// removes it once the run is done. Concrete bundling (which languages are
/// available, where they live) is the CLI front end's concern; the
/// orchestrator only needs a path to hand probes and a way to clean it up.
pub trait AssetExporter: Send + Sync {
    fn export(&self, sample_app_language: &str) -> Result<PathBuf>;
    fn cleanup(&self, path: &Path) -> Result<()>;
}

/// A signal that should interrupt a run in progress, from outside the
/// orchestrator's own control flow (a ctrl-c, a parent process asking the CLI
/// to wind down). `Graceful` still runs teardown; `Immediate` is for a second
/// press that means "stop asking."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownEvent {
    Graceful,
    Immediate,
}

/// The single channel external signals and the orchestrator's own completion
/// race over. Cloning [`ShutdownFunnel::sender`] out to a ctrl-c listener and
/// racing it against the run in [`Orchestrator::run`] means both "the task
/// loop finished" and "something asked us to stop" are just two producers
/// into the same funnel.
pub struct ShutdownFunnel {
    sender: mpsc::UnboundedSender<ShutdownEvent>,
    receiver: Mutex<mpsc::UnboundedReceiver<ShutdownEvent>>,
}

impl ShutdownFunnel {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ShutdownEvent> {
        self.sender.clone()
    }

    async fn recv(&self) -> Option<ShutdownEvent> {
        self.receiver.lock().await.recv().await
    }
}

impl Default for ShutdownFunnel {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a run ended.
#[derive(Debug)]
pub enum ExitReason {
    Completed,
    Failed(Error),
    ExternalSignal(ShutdownEvent),
}

/// The result of a full orchestrator run, after probes are shut down, the
/// test environment torn down, and the asset directory cleaned up.
#[derive(Debug)]
pub struct OrchestratorOutcome {
    pub reason: ExitReason,
}

impl OrchestratorOutcome {
    pub fn into_result(self) -> Result<()> {
        match self.reason {
            ExitReason::Completed => Ok(()),
            ExitReason::Failed(e) => Err(e),
            ExitReason::ExternalSignal(_) => Err(Error::Orchestrator("received external shutdown signal".into())),
        }
    }
}

/// Sequences a run end to end: export the sample app, connect to the
/// platform, install and post-connect every probe, run the configured tasks
/// gating probes as it goes, then unwind everything regardless of how the
/// run ended.
pub struct Orchestrator<C: PlatformCli> {
    platform: PlatformClient<C>,
    pool: Pool,
    asset_exporter: Arc<dyn AssetExporter>,
    sample_app_language: String,
    platform_config: PlatformConfig,
    tasks: Vec<TaskConfig>,
    watchful_logger: Logger,
    exported_asset_path: Option<PathBuf>,
}

impl<C: PlatformCli> Orchestrator<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: PlatformClient<C>,
        pool: Pool,
        asset_exporter: Arc<dyn AssetExporter>,
        sample_app_language: impl Into<String>,
        platform_config: PlatformConfig,
        tasks: Vec<TaskConfig>,
        watchful_logger: Logger,
    ) -> Self {
        Self {
            platform,
            pool,
            asset_exporter,
            sample_app_language: sample_app_language.into(),
            platform_config,
            tasks,
            watchful_logger,
            exported_asset_path: None,
        }
    }

    /// Races the run to completion against `shutdown`, then always tears
    /// down probes, the test environment, and the asset directory before
    /// returning — whichever branch of the race won.
    pub async fn run(mut self, shutdown: &ShutdownFunnel) -> OrchestratorOutcome {
        let reason = tokio::select! {
            biased;
            event = shutdown.recv() => ExitReason::ExternalSignal(event.unwrap_or(ShutdownEvent::Immediate)),
            result = self.run_inner() => match result {
                Ok(()) => ExitReason::Completed,
                Err(e) => ExitReason::Failed(e),
            },
        };

        let pool = std::mem::replace(&mut self.pool, Pool::new());
        pool.shutdown().await;
        self.watchful_logger.write_string("shutdown probes", LogLevel::Info);

        if let Err(e) = self.platform.teardown_test_environment().await {
            self.watchful_logger
                .write_string(&format!("could not teardown test environment: {e}"), LogLevel::Error);
        }

        if let Some(path) = self.exported_asset_path.take() {
            match self.asset_exporter.cleanup(&path) {
                Ok(()) => self.watchful_logger.write_string("cleaned asset directory", LogLevel::Info),
                Err(e) => self
                    .watchful_logger
                    .write_string(&format!("could not clean asset directory: {e}"), LogLevel::Error),
            }
        }

        self.watchful_logger.write_string("done, shutting down", LogLevel::Info);
        OrchestratorOutcome { reason }
    }

    async fn run_inner(&mut self) -> Result<()> {
        let asset_path = self.asset_exporter.export(&self.sample_app_language)?;
        self.watchful_logger
            .write_string(&format!("exported sample app to {}", asset_path.display()), LogLevel::Info);
        self.exported_asset_path = Some(asset_path);

        self.install_probes().await?;

        self.watchful_logger.write_string("targeting api endpoint", LogLevel::Info);
        self.platform
            .api(&self.platform_config.api_endpoint, !self.platform_config.skip_ssl_validation)
            .await
            .map_err(|e| {
                self.watchful_logger
                    .write_string(&format!("could not target api endpoint: {e}"), LogLevel::Error);
                e
            })?;

        self.watchful_logger.write_string("authenticating against api endpoint", LogLevel::Info);
        self.platform
            .authenticate(&self.platform_config.username, &self.platform_config.password)
            .await
            .map_err(|e| {
                self.watchful_logger
                    .write_string(&format!("could not authenticate against api endpoint: {e}"), LogLevel::Error);
                e
            })?;

        self.watchful_logger.write_string("creating test environment", LogLevel::Info);
        self.platform.create_test_environment().await.map_err(|e| {
            self.watchful_logger.write_string("could not create test environment", LogLevel::Error);
            e
        })?;

        self.post_connect_probes().await?;
        self.run_tasks().await
    }

    async fn install_probes(&self) -> Result<()> {
        self.watchful_logger.write_string("installing probes", LogLevel::Info);
        let barrier = self
            .pool
            .for_each(Consumer::asynchronous(|probe, future| {
                future.complete(probe.install().err());
            }))
            .await?;
        barrier.wait().await;
        if let Some(e) = barrier.first_error() {
            return Err(Error::Orchestrator(format!("could not install probes: {e}")));
        }
        self.watchful_logger.write_string("installed probes", LogLevel::Info);
        Ok(())
    }

    async fn post_connect_probes(&self) -> Result<()> {
        self.watchful_logger.write_string("post-connecting probes", LogLevel::Info);
        let barrier = self
            .pool
            .for_each(Consumer::asynchronous(|probe, future| {
                future.complete(probe.post_connect().err());
            }))
            .await?;
        barrier.wait().await;
        if let Some(e) = barrier.first_error() {
            return Err(Error::Orchestrator(format!("could not post-connect probes: {e}")));
        }
        self.watchful_logger.write_string("post-connected probes", LogLevel::Info);
        Ok(())
    }

    async fn run_tasks(&self) -> Result<()> {
        for (index, task) in self.tasks.iter().enumerate() {
            let task_number = index + 1;

            if !task.probe_whitelist.is_empty() {
                self.pool.apply_whitelist(&task.probe_whitelist).await;
            } else if !task.probe_blacklist.is_empty() {
                self.pool.apply_blacklist(&task.probe_blacklist).await;
            } else {
                self.pool.start_heartbeats().await;
            }

            self.watchful_logger.write_string(&format!("executing task #{task_number}"), LogLevel::Info);
            for beating in self.pool.beating_hearts() {
                self.watchful_logger.write_string(&format!(" - {beating}"), LogLevel::Info);
            }

            let platform_task = PlatformTask::new(task.cmd.clone(), task.args.clone());
            if let Err(e) = self.platform.execute(&platform_task).await {
                self.watchful_logger.write_string(&format!("task #{task_number} failed"), LogLevel::Error);
                return Err(Error::Orchestrator(format!("failure in task #{task_number}: {e}")));
            }
            self.watchful_logger.write_string(&format!("finished task #{task_number}"), LogLevel::Info);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{ChannelProvider, Factory};

    struct FakeCli;

    #[async_trait::async_trait]
    impl PlatformCli for FakeCli {
        async fn api(&self, _endpoint: &str, _validate_ssl: bool) -> Result<()> {
            Ok(())
        }
        async fn auth(&self, _username: &str, _password: &str) -> Result<()> {
            Ok(())
        }
        async fn create_organization(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn create_space(&self, _org: &str, _space: &str) -> Result<()> {
            Ok(())
        }
        async fn target(&self, _org: &str, _space: &str) -> Result<()> {
            Ok(())
        }
        async fn delete_organization(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NoopAssetExporter;
    impl AssetExporter for NoopAssetExporter {
        fn export(&self, _sample_app_language: &str) -> Result<PathBuf> {
            Ok(PathBuf::from("."))
        }
        fn cleanup(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn platform_config() -> PlatformConfig {
        PlatformConfig {
            domain: "apps.example.com".into(),
            api_endpoint: "https://api.example.com".into(),
            skip_ssl_validation: false,
            custom_cli_parameters: Vec::new(),
            username: "u".into(),
            password: "p".into(),
        }
    }

    fn orchestrator(tasks: Vec<TaskConfig>) -> Orchestrator<FakeCli> {
        let factory = Factory::new(ChannelProvider::new(10));
        Orchestrator::new(
            PlatformClient::new(FakeCli, factory.new_logger("cf-cli-worker")),
            Pool::new(),
            Arc::new(NoopAssetExporter),
            "go",
            platform_config(),
            tasks,
            factory.new_logger("watchful"),
        )
    }

    #[tokio::test]
    async fn completes_with_no_tasks() {
        let outcome = orchestrator(vec![]).run(&ShutdownFunnel::new()).await;
        assert!(matches!(outcome.reason, ExitReason::Completed));
    }

    #[tokio::test]
    async fn failing_task_surfaces_as_failed() {
        let tasks = vec![TaskConfig {
            cmd: "false".into(),
            args: vec![],
            probe_whitelist: vec![],
            probe_blacklist: vec![],
        }];
        let outcome = orchestrator(tasks).run(&ShutdownFunnel::new()).await;
        assert!(matches!(outcome.reason, ExitReason::Failed(_)));
    }

    #[tokio::test]
    async fn external_signal_short_circuits_the_run() {
        let shutdown = ShutdownFunnel::new();
        shutdown.sender().send(ShutdownEvent::Immediate).unwrap();
        let outcome = orchestrator(vec![]).run(&shutdown).await;
        assert!(matches!(outcome.reason, ExitReason::ExternalSignal(ShutdownEvent::Immediate)));
    }
}
