use patrol_engine::{CommandPromise, Error, PlatformCli, Result};

/// Drives the platform CLI binary (`cf` by default) as subprocesses. Unlike
/// the Go original, which only ever stubbed out authentication, this backs
/// every [`PlatformCli`] method with a real invocation, since the
/// orchestrator needs all six to sequence a run.
pub struct BashPlatformCli {
    binary: String,
}

impl BashPlatformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    fn run(&self, args: Vec<String>) -> CommandPromise {
        CommandPromise::new(self.binary.clone(), args)
    }
}

#[async_trait::async_trait]
impl PlatformCli for BashPlatformCli {
    async fn api(&self, endpoint: &str, validate_ssl: bool) -> Result<()> {
        let mut args = vec!["api".to_string(), endpoint.to_string()];
        if !validate_ssl {
            args.push("--skip-ssl-validation".to_string());
        }
        self.run(args).sync().await
    }

    async fn auth(&self, username: &str, password: &str) -> Result<()> {
        self.run(vec!["auth".to_string(), username.to_string(), password.to_string()]).sync().await
    }

    async fn create_organization(&self, name: &str) -> Result<()> {
        self.run(vec!["create-org".to_string(), name.to_string()]).sync().await
    }

    async fn create_space(&self, org: &str, space: &str) -> Result<()> {
        self.run(vec!["create-space".to_string(), space.to_string(), "-o".to_string(), org.to_string()])
            .sync()
            .await
    }

    async fn target(&self, org: &str, space: &str) -> Result<()> {
        self.run(vec!["target".to_string(), "-o".to_string(), org.to_string(), "-s".to_string(), space.to_string()])
            .sync()
            .await
    }

    async fn delete_organization(&self, name: &str) -> Result<()> {
        self.run(vec!["delete-org".to_string(), name.to_string(), "-f".to_string()]).sync().await
    }
}
