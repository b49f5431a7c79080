//! CLI commands implementation

use anyhow::{Context, Result};
use gpuq_core::{GpuqConfig, JobCommand, JobFile, JobTicket, ResourceId, SchedulerConfig};
use gpuq_runtime::process::ProcessLauncherConfig;
use gpuq_runtime::ProcessLauncher;
use gpuq_scheduler::SlotScheduler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
pub struct Overrides {
    pub slots: Option<String>,
    pub poll_interval: Option<f64>,
    pub env_var: Option<String>,
}

/// Load the configuration file (or defaults) and apply overrides
pub fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<GpuqConfig> {
    let mut config = match path {
        Some(path) => GpuqConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GpuqConfig::default(),
    };

    if let Some(slots) = overrides.slots {
        config.scheduler.slots = ResourceId::parse_list(&slots)?;
    }
    if let Some(secs) = overrides.poll_interval {
        config.scheduler.poll_interval_secs = secs;
    }
    if let Some(env_var) = overrides.env_var {
        config.scheduler.env_var = env_var;
    }

    config.scheduler.validate()?;
    Ok(config)
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Jobs that started, with where they ran
    pub launched: Vec<(String, JobTicket)>,
    /// Jobs that could not be started, with the reason
    pub failed: Vec<(String, String)>,
}

/// Submit every job in the file, then wait for all of them
pub async fn run(
    config: &SchedulerConfig,
    jobs: &Path,
    workdir: Option<PathBuf>,
    keep_going: bool,
) -> Result<RunSummary> {
    let commands = JobFile::from_file(jobs)?.commands()?;

    let launcher = ProcessLauncher::new(ProcessLauncherConfig {
        working_dir: workdir,
    });
    let mut scheduler = SlotScheduler::with_launcher(config, Arc::new(launcher))?;

    info!(jobs = commands.len(), file = %jobs.display(), "Starting job queue");
    run_queue(&mut scheduler, commands, keep_going).await
}

/// Submit labelled commands in order, then wait for all of them
pub async fn run_queue(
    scheduler: &mut SlotScheduler,
    commands: Vec<(String, JobCommand)>,
    keep_going: bool,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for (label, command) in commands {
        match scheduler.submit(&command).await {
            Ok(ticket) => {
                println!(
                    "[slot {}] {} -> {}={} ({})",
                    ticket.slot,
                    label,
                    scheduler.env_var(),
                    ticket.resource,
                    command
                );
                summary.launched.push((label, ticket));
            }
            Err(e) if keep_going && e.is_launch_failure() => {
                warn!(job = %label, error = %e, "Skipping job that failed to launch");
                summary.failed.push((label, e.to_string()));
            }
            Err(e) => {
                // Jobs already running keep their slots; drain them before bailing out
                if let Err(drain) = scheduler.wait_all().await {
                    error!(error = %drain, "Failed to drain running jobs");
                }
                return Err(e).with_context(|| format!("job '{}'", label));
            }
        }
    }

    scheduler.wait_all().await?;
    Ok(summary)
}

/// Print the outcome of a run
pub fn print_summary(summary: &RunSummary) {
    println!(
        "Launched {} job(s), {} failed to start",
        summary.launched.len(),
        summary.failed.len()
    );
    for (label, reason) in &summary.failed {
        println!("  {}: {}", label, reason);
    }
}

/// Validate configuration and job file, and print what would run
pub fn check(config: &GpuqConfig, jobs: Option<&Path>, json: bool) -> Result<()> {
    let commands = match jobs {
        Some(path) => JobFile::from_file(path)?.commands()?,
        None => Vec::new(),
    };

    if json {
        let jobs: Vec<_> = commands.iter().map(|(_, command)| command).collect();
        let value = serde_json::json!({
            "config": config,
            "jobs": jobs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let scheduler = &config.scheduler;
    println!(
        "Slots: {} (poll every {}s, exported as {})",
        scheduler.slots.len(),
        scheduler.poll_interval_secs,
        scheduler.env_var
    );
    println!("{:<6} {:<12}", "SLOT", "RESOURCE");
    println!("{}", "-".repeat(20));
    for (index, resource) in scheduler.slots.iter().enumerate() {
        println!("{:<6} {:<12}", index, resource);
    }

    if jobs.is_some() {
        println!();
        println!("Jobs: {}", commands.len());
        for (label, command) in &commands {
            println!("  {}: {}", label, command);
        }
    }

    Ok(())
}
