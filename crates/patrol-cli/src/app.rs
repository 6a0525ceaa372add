use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc as std_mpsc;
use std::sync::Mutex;
use std::time::Duration;

use patrol_engine::logger::{LogLevel, Logger};
use patrol_engine::probes::{AppProvider, LogSource};
use patrol_engine::{Error, Result};

/// Pushes and force-pushes a single sample app via the `cf` binary. `push`
/// only deploys once; later callers observe the already-pushed app without
/// paying for a redeploy.
pub struct CliAppProvider {
    binary: String,
    app_name: String,
    asset_path: PathBuf,
    pushed: Mutex<bool>,
}

impl CliAppProvider {
    pub fn new(binary: impl Into<String>, app_name: impl Into<String>, asset_path: PathBuf) -> Self {
        Self {
            binary: binary.into(),
            app_name: app_name.into(),
            asset_path,
            pushed: Mutex::new(false),
        }
    }

    fn run_push(&self, logger: &Logger) -> Result<()> {
        let output = Command::new(&self.binary)
            .args([
                "push",
                &self.app_name,
                "-p",
                self.asset_path.to_str().unwrap_or_default(),
                "-i",
                "1",
            ])
            .output()
            .map_err(|e| Error::Platform(format!("failed to spawn {}: {e}", self.binary)))?;

        if !output.stdout.is_empty() {
            logger.write(&output.stdout, LogLevel::Info);
        }
        if !output.stderr.is_empty() {
            logger.write(&output.stderr, LogLevel::Error);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Platform(format!("{} push exited with status {}", self.binary, output.status)))
        }
    }
}

impl AppProvider for CliAppProvider {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn push(&self, logger: &Logger) -> Result<()> {
        let mut pushed = self.pushed.lock().expect("app provider mutex poisoned");
        if *pushed {
            return Ok(());
        }
        self.run_push(logger)?;
        *pushed = true;
        Ok(())
    }

    fn force_push(&self, logger: &Logger) -> Result<()> {
        self.run_push(logger)?;
        *self.pushed.lock().expect("app provider mutex poisoned") = true;
        Ok(())
    }
}

/// Fetches and tails app logs via the `cf` binary. `stream_logs` bounds the
/// tail to `timeout`: whatever arrived in that window is returned, even if
/// the child process is still running when the window closes.
pub struct CliLogSource {
    binary: String,
}

impl CliLogSource {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl LogSource for CliLogSource {
    fn recent_logs(&self, app_name: &str) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(["logs", app_name, "--recent"])
            .output()
            .map_err(|e| Error::Platform(format!("failed to spawn {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(Error::Platform(format!("{} logs --recent exited with status {}", self.binary, output.status)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn stream_logs(&self, app_name: &str, timeout: Duration) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(["logs", app_name])
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Platform(format!("failed to spawn {}: {e}", self.binary)))?;

        let mut stdout = child.stdout.take().expect("piped stdout");
        let (tx, rx) = std_mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });

        let buf = match rx.recv_timeout(timeout) {
            Ok(buf) => buf,
            Err(std_mpsc::RecvTimeoutError::Timeout) => Vec::new(),
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Vec::new(),
        };

        let _ = child.kill();
        let _ = child.wait();

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_runs_once() {
        let provider = CliAppProvider::new("true", "sample-app", PathBuf::from("temp/sample-app"));
        let factory = patrol_engine::logger::Factory::new(patrol_engine::logger::ChannelProvider::new(10));
        let logger = factory.new_logger("app");
        assert!(provider.push(&logger).is_ok());
        assert!(*provider.pushed.lock().unwrap());
        assert!(provider.push(&logger).is_ok());
    }

    #[test]
    fn force_push_surfaces_failure() {
        let provider = CliAppProvider::new("false", "sample-app", PathBuf::from("temp/sample-app"));
        let factory = patrol_engine::logger::Factory::new(patrol_engine::logger::ChannelProvider::new(10));
        let logger = factory.new_logger("app");
        assert!(provider.force_push(&logger).is_err());
    }
}
