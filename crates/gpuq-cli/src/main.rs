//! gpuq CLI
//!
//! Runs a queue of jobs over a fixed set of GPU slots.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// gpuq - run experiment queues on a fixed set of GPU slots
#[derive(Parser, Debug)]
#[command(name = "gpuq")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Scheduler settings that override the configuration file
#[derive(Args, Debug, Default)]
struct SchedulerArgs {
    /// Comma-separated slot resources, repeats allowed (e.g. 0,1,1)
    #[arg(long)]
    slots: Option<String>,

    /// Seconds between liveness checks
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Variable that carries the slot resource to each job
    #[arg(long)]
    env_var: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every job of a job file, then wait for all of them
    Run {
        /// Job file (TOML)
        jobs: PathBuf,

        #[command(flatten)]
        scheduler: SchedulerArgs,

        /// Working directory for jobs
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Continue with the next job when one fails to launch
        #[arg(long)]
        keep_going: bool,
    },

    /// Validate the configuration and an optional job file
    Check {
        /// Job file (TOML)
        jobs: Option<PathBuf>,

        #[command(flatten)]
        scheduler: SchedulerArgs,

        /// Print the resolved configuration as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn scheduler_args(&self) -> &SchedulerArgs {
        match self {
            Commands::Run { scheduler, .. } | Commands::Check { scheduler, .. } => scheduler,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = cli.command.scheduler_args();
    let config = commands::resolve_config(
        cli.config.as_deref(),
        commands::Overrides {
            slots: overrides.slots.clone(),
            poll_interval: overrides.poll_interval,
            env_var: overrides.env_var.clone(),
        },
    )?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Run {
            jobs,
            workdir,
            keep_going,
            ..
        } => {
            let summary = commands::run(&config.scheduler, &jobs, workdir, keep_going).await?;
            commands::print_summary(&summary);
            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Check { jobs, json, .. } => {
            commands::check(&config, jobs.as_deref(), json)?;
        }
    }

    Ok(())
}
