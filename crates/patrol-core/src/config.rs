use serde::Deserialize;

/// Top-level configuration consumed by the orchestrator's `Configure` state.
///
/// This type is never parsed from YAML/JSON by the engine itself; the CLI front
/// end is responsible for producing one (see `patrol-cli`'s config loader).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cf: PlatformConfig,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub probes: Vec<ProbeConfig>,
    #[serde(default)]
    pub logger_config: LoggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub domain: String,
    pub api_endpoint: String,
    #[serde(default)]
    pub skip_ssl_validation: bool,
    #[serde(default)]
    pub custom_cli_parameters: Vec<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub probe_whitelist: Vec<String>,
    #[serde(default)]
    pub probe_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub name: String,
    pub threshold: String,
    /// Heartbeat period in milliseconds; a missing value defers to the probe
    /// kind's own default (see `patrol_engine::probes`).
    #[serde(default)]
    pub heartbeat_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_time_location")]
    pub time_location: String,
    #[serde(default)]
    pub print_logger_name: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            time_location: default_time_location(),
            print_logger_name: false,
        }
    }
}

fn default_time_location() -> String {
    "Local".to_string()
}
