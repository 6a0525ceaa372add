use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::logger::{LogLevel, Logger};

const WATCHFUL_ORG_NAME: &str = "watchful";
const WATCHFUL_SPACE_NAME: &str = "watchful";

/// One task the orchestrator runs against the platform CLI: a command plus
/// its arguments, executed exactly as given (no shell interpolation).
#[derive(Debug, Clone)]
pub struct PlatformTask {
    pub command: String,
    pub args: Vec<String>,
}

impl PlatformTask {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// A spawned-but-not-yet-awaited command whose stdout/stderr are routed to a
/// logger at a fixed level apiece. `sync` drives it to completion inline;
/// `spawn_detached` hands back a join handle a caller can await later.
pub struct CommandPromise {
    command: String,
    args: Vec<String>,
    out_logger: Option<(Logger, LogLevel)>,
    err_logger: Option<(Logger, LogLevel)>,
}

impl CommandPromise {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            out_logger: None,
            err_logger: None,
        }
    }

    pub fn subscribe_out(mut self, logger: Logger, level: LogLevel) -> Self {
        self.out_logger = Some((logger, level));
        self
    }

    pub fn subscribe_err(mut self, logger: Logger, level: LogLevel) -> Self {
        self.err_logger = Some((logger, level));
        self
    }

    /// Runs the command to completion on the calling task, forwarding output
    /// line-by-line to whichever loggers were subscribed.
    pub async fn sync(self) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Platform(format!("failed to spawn {}: {e}", self.command)))?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let out_logger = self.out_logger.clone();
        let err_logger = self.err_logger.clone();

        let out_task: JoinHandle<()> = tokio::spawn(async move {
            if let Some(mut pipe) = stdout.take() {
                let mut buf = Vec::new();
                if pipe.read_to_end(&mut buf).await.is_ok() {
                    if let Some((logger, level)) = out_logger {
                        if !buf.is_empty() {
                            logger.write(&buf, level);
                        }
                    }
                }
            }
        });
        let err_task: JoinHandle<()> = tokio::spawn(async move {
            if let Some(mut pipe) = stderr.take() {
                let mut buf = Vec::new();
                if pipe.read_to_end(&mut buf).await.is_ok() {
                    if let Some((logger, level)) = err_logger {
                        if !buf.is_empty() {
                            logger.write(&buf, level);
                        }
                    }
                }
            }
        });

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Platform(format!("failed to wait on {}: {e}", self.command)))?;
        let _ = out_task.await;
        let _ = err_task.await;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Platform(format!(
                "{} exited with status {status}",
                self.command
            )))
        }
    }

    /// Runs the command on a spawned task and calls `subscriber` with the
    /// outcome once it completes, returning a handle the caller can await.
    pub fn spawn_detached(self, subscriber: impl FnOnce(Result<()>) + Send + 'static) -> JoinHandle<()> {
        tokio::spawn(async move {
            let result = self.sync().await;
            subscriber(result);
        })
    }
}

/// The capability to drive a CLI binary: target an API endpoint, authenticate,
/// and manage the organization/space test environment used for the run.
#[async_trait::async_trait]
pub trait PlatformCli: Send + Sync {
    async fn api(&self, endpoint: &str, validate_ssl: bool) -> Result<()>;
    async fn auth(&self, username: &str, password: &str) -> Result<()>;
    async fn create_organization(&self, name: &str) -> Result<()>;
    async fn create_space(&self, org: &str, space: &str) -> Result<()>;
    async fn target(&self, org: &str, space: &str) -> Result<()>;
    async fn delete_organization(&self, name: &str) -> Result<()>;
}

/// Wraps a [`PlatformCli`] and a [`Logger`] into the orchestrator-facing
/// capability: connect, stand up and tear down the shared test environment,
/// and run arbitrary [`PlatformTask`]s.
pub struct PlatformClient<C: PlatformCli> {
    cli: C,
    logger: Logger,
}

impl<C: PlatformCli> PlatformClient<C> {
    pub fn new(cli: C, logger: Logger) -> Self {
        Self { cli, logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn api(&self, endpoint: &str, validate_ssl: bool) -> Result<()> {
        self.cli.api(endpoint, validate_ssl).await
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        self.cli.auth(username, password).await
    }

    pub async fn create_test_environment(&self) -> Result<()> {
        self.cli.create_organization(WATCHFUL_ORG_NAME).await?;
        self.cli.create_space(WATCHFUL_ORG_NAME, WATCHFUL_SPACE_NAME).await?;
        self.cli.target(WATCHFUL_ORG_NAME, WATCHFUL_SPACE_NAME).await
    }

    pub async fn teardown_test_environment(&self) -> Result<()> {
        self.cli.delete_organization(WATCHFUL_ORG_NAME).await
    }

    pub async fn execute(&self, task: &PlatformTask) -> Result<()> {
        CommandPromise::new(task.command.clone(), task.args.clone())
            .subscribe_out(self.logger.clone(), LogLevel::Info)
            .subscribe_err(self.logger.clone(), LogLevel::Error)
            .sync()
            .await
    }
}
