//! Main scheduler logic

use chrono::Utc;
use gpuq_core::{
    GpuqError, GpuqResult, JobCommand, JobTicket, SchedulerConfig, SlotStatus,
};
use gpuq_runtime::{Launcher, ProcessLauncher, ResourceBinding};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::slot_table::{RunningJob, SlotTable};

/// Round-robin scheduler over a fixed ring of resource slots
///
/// Every slot runs at most one job at a time. `submit` waits until the
/// cursor reaches a free slot and launches the job there with the slot's
/// resource exported through the configured variable; `wait_all` waits
/// until every slot is empty. Both wait by polling: each liveness check on
/// a slot that is empty or still busy is followed by a sleep of the poll
/// interval before the cursor moves on.
///
/// Neither call has a timeout. Wrap them in `tokio::time::timeout` when a
/// deadline is needed; dropping a pending call leaves the scheduler
/// consistent.
pub struct SlotScheduler {
    /// Slots and cursor
    table: SlotTable,
    /// Sleep between two liveness checks
    poll_interval: Duration,
    /// Resource-selection variable exported to jobs
    env_var: String,
    /// Starts jobs
    launcher: Arc<dyn Launcher>,
}

impl SlotScheduler {
    /// Create a scheduler that runs jobs as child processes
    pub fn new(config: &SchedulerConfig) -> GpuqResult<Self> {
        Self::with_launcher(config, Arc::new(ProcessLauncher::default()))
    }

    /// Create a scheduler with a custom launcher
    pub fn with_launcher(
        config: &SchedulerConfig,
        launcher: Arc<dyn Launcher>,
    ) -> GpuqResult<Self> {
        config.validate()?;
        let poll_interval = config.poll_interval()?;
        let table = SlotTable::new(config.slots.clone())?;

        info!(
            slots = table.len(),
            poll_interval_secs = config.poll_interval_secs,
            env_var = %config.env_var,
            launcher = launcher.name(),
            "Scheduler initialized"
        );

        Ok(Self {
            table,
            poll_interval,
            env_var: config.env_var.clone(),
            launcher,
        })
    }

    /// Launch a job in the next free slot, waiting for one if necessary
    ///
    /// Returns as soon as the job has started. If the launch fails the slot
    /// stays empty and the cursor stays on it.
    pub async fn submit(&mut self, command: &JobCommand) -> GpuqResult<JobTicket> {
        if command.program.is_empty() {
            return Err(GpuqError::InvalidCommand(
                "program name is empty".to_string(),
            ));
        }

        while !self.table.cursor_is_free() {
            self.refresh_cursor().await?;
        }

        let slot = self.table.cursor();
        let resource = self
            .table
            .resource(slot)
            .cloned()
            .ok_or_else(|| GpuqError::Config(format!("slot {} out of range", slot)))?;

        let binding = ResourceBinding {
            env_var: &self.env_var,
            resource: &resource,
        };
        let handle = self.launcher.launch(command, binding).await?;

        let id = Uuid::new_v4();
        let pid = handle.pid();

        info!(
            job_id = %id,
            slot = slot,
            resource = %resource,
            pid = ?pid,
            command = %command,
            "Job launched"
        );

        let job = RunningJob {
            id,
            program: command.program.clone(),
            started_at: Utc::now(),
            handle,
        };
        // The exclusive borrow rules out another launch into this slot
        let occupied = self.table.occupy_cursor(job);
        debug_assert!(occupied.is_ok(), "slot {} taken during launch", slot);
        self.table.advance();

        Ok(JobTicket {
            id,
            slot,
            resource,
            pid,
        })
    }

    /// Build a command from argv and submit it
    pub async fn submit_argv<I, S>(&mut self, argv: I) -> GpuqResult<JobTicket>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = JobCommand::from_argv(argv)?;
        self.submit(&command).await
    }

    /// True when no slot holds a job
    ///
    /// Reflects what the scheduler has observed so far; a job that exited
    /// but has not been checked yet still counts.
    pub fn is_idle(&self) -> bool {
        self.table.is_idle()
    }

    /// Wait until every submitted job has exited
    pub async fn wait_all(&mut self) -> GpuqResult<()> {
        while !self.table.is_idle() {
            self.refresh_cursor().await?;
        }
        debug!("All slots idle");
        Ok(())
    }

    /// Check the slot under the cursor once
    ///
    /// A finished job is cleared and the cursor stays put. Otherwise the
    /// cursor moves to the next slot and the caller sleeps for the poll
    /// interval, so a sweep keeps its progress even when the call is dropped
    /// mid-sleep. A failing liveness check is returned as an error with the
    /// slot left occupied.
    async fn refresh_cursor(&mut self) -> GpuqResult<()> {
        let slot = self.table.cursor();

        let exited = match self.table.cursor_job_mut() {
            Some(job) => job
                .handle
                .try_wait()
                .map_err(|source| GpuqError::Liveness { slot, source })?,
            None => None,
        };

        if let Some(status) = exited {
            if let Some(job) = self.table.release_cursor() {
                log_exit(slot, &job, status);
            }
            return Ok(());
        }

        self.table.advance();
        tokio::time::sleep(self.poll_interval).await;
        Ok(())
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; construction rejects an empty slot list
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Slot the next submission will try first
    pub fn cursor(&self) -> usize {
        self.table.cursor()
    }

    /// Number of slots holding a job
    pub fn occupied_count(&self) -> usize {
        self.table.occupied_count()
    }

    /// Snapshot of every slot
    pub fn slots(&self) -> Vec<SlotStatus> {
        self.table.snapshot()
    }

    /// Configured poll interval
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Resource-selection variable exported to jobs
    pub fn env_var(&self) -> &str {
        &self.env_var
    }
}

fn log_exit(slot: usize, job: &RunningJob, status: ExitStatus) {
    let runtime_secs = (Utc::now() - job.started_at).num_milliseconds() as f64 / 1000.0;

    if status.success() {
        debug!(
            job_id = %job.id,
            slot = slot,
            runtime_secs = runtime_secs,
            "Job finished, slot free"
        );
    } else {
        warn!(
            job_id = %job.id,
            slot = slot,
            program = %job.program,
            status = %status,
            runtime_secs = runtime_secs,
            "Job exited unsuccessfully, slot free"
        );
    }
}
