mod app;
mod assets;
mod cli;
mod loader;
mod platform_cli;
mod probes;
mod shutdown;
mod terminal;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use patrol_engine::logger::{ChannelProvider, Cluster, Factory, GroupContainer, SplitPipeline, SplitPipelineConfig};
use patrol_engine::{Orchestrator, PlatformClient, Pool, ShutdownFunnel};

use crate::app::{CliAppProvider, CliLogSource};
use crate::assets::FilesystemAssetExporter;
use crate::cli::{Cli, Command, RunArgs};
use crate::platform_cli::BashPlatformCli;
use crate::shutdown::{spawn_ctrl_c_handler, ShutdownController};

const PLATFORM_CLI_BINARY: &str = "cf";
const EXPORT_ROOT: &str = "temp";
const CLUSTER_FLUSH_INTERVAL: Duration = Duration::from_millis(200);
const LOGGER_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Command::Run(args) = cli.command;
    run(args).await
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = loader::load(args.config_file.as_deref(), args.config_inline.as_deref())?;

    let channel_provider = ChannelProvider::new(LOGGER_CHANNEL_CAPACITY);
    let factory = Factory::new(channel_provider.clone());
    let platform_logger = factory.new_logger("cf-cli-worker");
    let watchful_logger = factory.new_logger("watchful");

    let mut groups = GroupContainer::new();
    groups.new_group([platform_logger.id()]);
    groups.new_group([watchful_logger.id()]);

    let show_logger_name = config.logger_config.print_logger_name || args.verbose > 0;
    let width = args.width.unwrap_or_else(terminal::terminal_width);
    let pipeline_config = SplitPipelineConfig::new(show_logger_name, width, groups.logger_group_table());
    let pipeline = SplitPipeline::new(pipeline_config, Box::new(std::io::stdout()));
    let cluster = Arc::new(Cluster::new(&channel_provider, pipeline, CLUSTER_FLUSH_INTERVAL));
    let cluster_task = tokio::task::spawn_blocking({
        let cluster = cluster.clone();
        move || cluster.start_listening()
    });

    let asset_exporter = Arc::new(FilesystemAssetExporter::new(EXPORT_ROOT));
    let asset_path = asset_exporter.target_path();
    let app_provider: Arc<dyn patrol_engine::probes::AppProvider> =
        Arc::new(CliAppProvider::new(PLATFORM_CLI_BINARY, "sample-app", asset_path));
    let log_source: Arc<dyn patrol_engine::probes::LogSource> = Arc::new(CliLogSource::new(PLATFORM_CLI_BINARY));

    let mut pool = Pool::new();
    for probe_config in &config.probes {
        let (probe, period) = probes::build(probe_config, &factory, &config.cf.domain, app_provider.clone(), log_source.clone())?;
        pool.start_worker(
            probe_config.name.clone(),
            probe,
            period,
            patrol_engine::Consumer::sync(|probe, future| {
                let result = probe.execute();
                match &result {
                    Ok(()) => probe.base_mut().record_successful_run(),
                    Err(_) => probe.base_mut().record_failed_run(),
                }
                future.complete(result.err());
            }),
        );
    }

    let platform = PlatformClient::new(BashPlatformCli::new(PLATFORM_CLI_BINARY), platform_logger.clone());
    let orchestrator = Orchestrator::new(
        platform,
        pool,
        asset_exporter,
        args.sample_app_language.clone(),
        config.cf.clone(),
        config.tasks.clone(),
        watchful_logger.clone(),
    );

    let funnel = ShutdownFunnel::new();
    let shutdown_controller = Arc::new(ShutdownController::new());
    spawn_ctrl_c_handler(shutdown_controller, funnel.sender(), watchful_logger.clone());

    let outcome = orchestrator.run(&funnel).await;

    drop(factory);
    drop(platform_logger);
    drop(watchful_logger);
    drop(channel_provider);

    let _ = cluster_task.await;

    match &outcome.reason {
        patrol_engine::ExitReason::Completed => {}
        patrol_engine::ExitReason::Failed(e) => eprintln!("run failed: {e}"),
        patrol_engine::ExitReason::ExternalSignal(_) => eprintln!("run interrupted"),
    }

    outcome.into_result().map_err(anyhow::Error::from)
}
