use anyhow::Context;
use clap::{Parser, Subcommand};
use ilr_validate::config::ValidationConfig;
use ilr_validate::model::{Message, ValidationRunContext};
use ilr_validate::pipeline::{
    FileCachePopulator, JsonFileOutput, PreValidationPipeline, StdoutOutput, ValidationOutput,
};
use ilr_validate::shard::ShardPartitioner;
use ilr_validate::worker::{LocalWorkerLauncher, ShardCoordinator};
use ilr_validate::CancellationSignal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Pre-validate ILR submissions against the funding rule base
#[derive(Parser)]
#[command(name = "ilr-validate")]
#[command(about = "Sharded pre-validation of ILR learner submissions", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pre-validation pipeline over one message
    Validate {
        /// Submission message as JSON
        #[arg(short, long)]
        message: PathBuf,

        /// Reference snapshot (lookups, reference data, file data) as JSON
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Collection return period
        #[arg(long, default_value = "1")]
        return_period: u32,
    },
    /// Show how a message would be sharded without validating it
    Plan {
        /// Submission message as JSON
        #[arg(short, long)]
        message: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.clone().unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        2 => "trace".to_string(),
        _ => "trace,tokio=debug".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .with_writer(std::io::stderr)
        .init();

    debug!("ilr-validate started with verbosity level: {}", cli.verbose);
    trace!("Effective configuration: {:?}", config);

    let result = match cli.command {
        Commands::Validate {
            message,
            snapshot,
            output,
            return_period,
        } => run_validate(&config, &message, snapshot, output, return_period).await,
        Commands::Plan { message } => run_plan(&config, &message).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<ValidationConfig> {
    let config = match path {
        Some(path) => ValidationConfig::load(path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ValidationConfig::from_env()?,
    };
    Ok(config)
}

async fn read_message(path: &Path) -> anyhow::Result<Message> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read message {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse message {}", path.display()))
}

async fn run_validate(
    config: &ValidationConfig,
    message_path: &Path,
    snapshot_path: PathBuf,
    output_path: Option<PathBuf>,
    return_period: u32,
) -> anyhow::Result<()> {
    let message = read_message(message_path).await?;

    let file_reference = message_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let container = message_path
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let context = ValidationRunContext::new(
        file_reference,
        container,
        snapshot_path.display().to_string(),
        return_period,
    );

    let output: Arc<dyn ValidationOutput> = match output_path {
        Some(path) => Arc::new(JsonFileOutput::new(path)),
        None => Arc::new(StdoutOutput),
    };
    let coordinator =
        ShardCoordinator::from_config(Arc::new(LocalWorkerLauncher::default()), config);

    let cancellation = CancellationSignal::new();
    cancellation.cancel_on_ctrl_c();

    let pipeline = PreValidationPipeline::new(
        Arc::new(FileCachePopulator::new(snapshot_path)),
        Arc::new(coordinator),
        output,
    )
    .with_cancellation(cancellation);

    let outcome = pipeline.execute(&message, &context).await?;
    info!(
        "Job {} {}: {} violations",
        context.job_id, outcome.summary.status, outcome.summary.total
    );
    Ok(())
}

async fn run_plan(config: &ValidationConfig, message_path: &Path) -> anyhow::Result<()> {
    let message = read_message(message_path).await?;
    let plan = ShardPartitioner::new(config.shard_size()).partition(&message);

    println!(
        "{} learners, {} DP records, shard size {}",
        message.learner_count(),
        message.destination_and_progression_count(),
        config.shard_size()
    );
    for shard in plan.into_shards() {
        println!(
            "{:<12} {:>6} learners {:>6} DP records",
            shard.label(),
            shard.message.learner_count(),
            shard.message.destination_and_progression_count()
        );
    }
    Ok(())
}
