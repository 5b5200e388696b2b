use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use task_recorder::{
    shell, Config, Overrides, RecorderLocator, RecorderSupervisor, SessionController,
    SessionSettings, TaskSourceFactory, TerminalView,
};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Operator console for supervised dataset recording", long_about = None)]
struct Args {
    /// Configuration file (optional)
    #[arg(short, long, default_value = "task-recorder.toml")]
    config: PathBuf,

    /// Operator name passed to the recorder
    #[arg(long)]
    operator: Option<String>,

    /// Recorder executable, skips the search next to this binary
    #[arg(long)]
    recorder: Option<PathBuf>,

    /// Base URL of the task backend
    #[arg(long)]
    task_api: Option<String>,

    /// JSON array of task strings, used when no backend is given
    #[arg(long)]
    tasks_json: Option<PathBuf>,

    /// Directory the recorder writes its sessions into
    #[arg(long)]
    dataset_root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(&args.config)?.apply(Overrides {
        operator_name: args.operator,
        recorder_script: args.recorder,
        task_api_base: args.task_api,
        tasks_json: args.tasks_json,
        dataset_root: args.dataset_root,
    });

    info!("Task Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Dataset root: {}", cfg.dataset_root.display());

    let source = TaskSourceFactory::from_config(&cfg)?;

    let (exit_tx, exit_rx) = mpsc::unbounded_channel();
    let supervisor = RecorderSupervisor::new(
        RecorderLocator::new(cfg.recorder_script.clone()),
        cfg.recorder_interpreter.clone(),
        exit_tx,
    );

    let settings = SessionSettings {
        dataset_root: cfg.dataset_root.clone(),
        operator: cfg.operator(),
        shutdown: cfg.shutdown_policy(),
        exit_codes: cfg.exit_code_policy(),
    };

    let controller =
        SessionController::new(source, supervisor, Box::new(TerminalView::new()), settings);

    let interrupts = shell::forward_interrupts()?;
    let input = BufReader::new(tokio::io::stdin());

    shell::run(controller, exit_rx, input, interrupts).await
}
