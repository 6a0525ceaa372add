use std::path::Path;

use patrol_core::Config;

/// Reads a [`Config`] from either a file or an inline JSON string, whichever
/// the caller has on hand. Callers are expected to enforce that exactly one
/// is present (clap's `ArgGroup` does this for the CLI's own arguments).
pub fn load(config_file: Option<&Path>, config_inline: Option<&str>) -> anyhow::Result<Config> {
    let raw = match (config_file, config_inline) {
        (Some(path), _) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read config file {}: {e}", path.display()))?,
        (None, Some(inline)) => inline.to_string(),
        (None, None) => anyhow::bail!("no configuration source given"),
    };

    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("could not parse configuration: {e}"))
}
