// src/main.rs
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info};

use erysa::config::{LoggingSettings, Settings};
use erysa::engine::{DispatchMode, RunArgs, RunSummary, Task, WorkerLauncher, Workflow, WorkflowConfig};
use erysa::Logging;

#[derive(Parser)]
#[command(name = "erysa")]
#[command(about = "Fan a task out across worker agents using process and thread pools")]
struct Args {
    #[command(subcommand)]
    command: Cli,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Maximum concurrent jobs (0 = one per CPU)")]
    max_workers: Option<usize>,

    #[arg(long, short, global = true, help = "Write the JSON summary to this file instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cli {
    /// Run one task on every worker, each in its own process
    Run {
        #[arg(help = "Task description")]
        task: String,

        #[arg(long, help = "Per-job timeout in seconds")]
        timeout: Option<f64>,

        #[command(flatten)]
        worker_args: WorkerArgs,
    },

    /// Run a task list in batches on worker processes
    Batch {
        #[arg(short, long, help = "Task file (.json array or one task per line)")]
        tasks: PathBuf,

        #[arg(short, long, help = "Tasks per batch")]
        batch_size: Option<usize>,

        #[command(flatten)]
        worker_args: WorkerArgs,
    },

    /// Run one task on every worker using threads
    AsyncRun {
        #[arg(help = "Task description")]
        task: String,

        #[command(flatten)]
        worker_args: WorkerArgs,
    },

    /// Run a task list on threads, one job per task
    Concurrent {
        #[arg(short, long, help = "Task file (.json array or one task per line)")]
        tasks: PathBuf,

        #[command(flatten)]
        worker_args: WorkerArgs,
    },

    /// Initialize config
    Init {
        #[arg(short, long, help = "Force overwrite existing configuration")]
        force: bool,
    },

    /// Serve a single job on stdin/stdout (used by the process pool)
    #[command(hide = true)]
    Worker,
}

#[derive(ClapArgs)]
struct WorkerArgs {
    #[arg(long = "arg", help = "Extra argument passed to every worker (repeatable)")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Cli::Worker => return serve_worker(),
        Cli::Init { force } => {
            let config_path = Settings::init(*force)?;
            println!("Configuration initialized at {}", config_path.display());
            return Ok(());
        }
        _ => {}
    }

    // Nothing logs before the subscriber is installed, so read first and validate after
    let mut settings = Settings::read(args.config.as_deref())?;
    if args.verbose {
        settings.logging.level = "debug".to_string();
    }
    if let Some(max_workers) = args.max_workers {
        settings.workflow.max_workers = max_workers;
    }

    let logging = Logging::init(&settings.logging)?;
    info!("Starting erysa v{}", env!("CARGO_PKG_VERSION"));
    match Settings::resolve_path(args.config.as_deref())? {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using built-in defaults"),
    }
    settings.validate()?;

    let workflow = Workflow::new(WorkflowConfig::from_settings(&settings))
        .with_launcher(WorkerLauncher::current_exe()?);
    let started_at = chrono::Utc::now();

    let (mode, results) = match args.command {
        Cli::Run { task, timeout, worker_args } => {
            let mut run_args = RunArgs::new().with_args(worker_args.args);
            if let Some(secs) = timeout.or(settings.workflow.timeout_secs) {
                let timeout = Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("Invalid timeout: {}", secs))?;
                run_args = run_args.with_timeout(timeout);
            }
            (DispatchMode::Run, workflow.run(&Task::new(task), &run_args).await)
        }
        Cli::Batch { tasks, batch_size, worker_args } => {
            let tasks = Task::load_all(&tasks)?;
            let batch_size = batch_size.unwrap_or(settings.workflow.batch_size);
            let run_args = RunArgs::new().with_args(worker_args.args);
            (DispatchMode::BatchedRun, workflow.batched_run(&tasks, batch_size, &run_args).await)
        }
        Cli::AsyncRun { task, worker_args } => {
            let run_args = RunArgs::new().with_args(worker_args.args);
            (DispatchMode::AsyncRun, workflow.async_run(&Task::new(task), &run_args).await)
        }
        Cli::Concurrent { tasks, worker_args } => {
            let tasks = Task::load_all(&tasks)?;
            let run_args = RunArgs::new().with_args(worker_args.args);
            (DispatchMode::ConcurrentRun, workflow.concurrent_run(&tasks, &run_args).await)
        }
        Cli::Init { .. } | Cli::Worker => unreachable!("handled before settings are loaded"),
    };

    let Some(results) = results else {
        error!("Workflow {} could not dispatch {}", workflow.config().name(), mode);
        logging.shutdown();
        exit(1);
    };

    let summary = RunSummary::new(workflow.config().name(), mode, started_at, results);
    info!("{} finished with status {:?}: {} succeeded, {} failed",
        mode, summary.status, summary.succeeded, summary.failed);
    write_summary(&summary, args.output.as_deref())?;

    logging.shutdown();
    Ok(())
}

/// Child side of the process pool
fn serve_worker() -> Result<()> {
    let logging = Logging::init(&LoggingSettings {
        level: "warn".to_string(),
        ansi: false,
    })?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    erysa::engine::serve_job(stdin.lock(), stdout.lock())?;

    logging.shutdown();
    Ok(())
}

fn write_summary(summary: &RunSummary, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize results")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
