use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "patrolctl", version, about = "Platform-availability probing runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a probing session until its tasks complete or it is interrupted.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("config_source").required(true).args(["config_file", "config_inline"])))]
pub struct RunArgs {
    /// Path to a JSON configuration file.
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Inline JSON configuration, as an alternative to --config-file.
    #[arg(long, value_name = "JSON")]
    pub config_inline: Option<String>,

    /// Terminal width to wrap log output at. Autodetected when omitted.
    #[arg(long)]
    pub width: Option<usize>,

    /// Which sample app language to export and push.
    #[arg(long, default_value = "go")]
    pub sample_app_language: String,

    /// Increase log verbosity; repeatable (-v, -vv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
