//! Launcher trait definitions

use async_trait::async_trait;
use gpuq_core::{GpuqResult, JobCommand, ResourceId};
use std::process::ExitStatus;

/// Resource a job is bound to for its whole lifetime
#[derive(Debug, Clone, Copy)]
pub struct ResourceBinding<'a> {
    /// Name of the resource-selection variable
    pub env_var: &'a str,
    /// Value exported through that variable
    pub resource: &'a ResourceId,
}

/// Handle to a launched job
pub trait JobHandle: Send {
    /// OS process id, if known
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check
    ///
    /// Returns `Ok(None)` while the job is running and `Ok(Some(status))`
    /// once it has exited. An `Err` means the check itself failed and says
    /// nothing about whether the job is still alive.
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>>;
}

/// Launcher trait for starting jobs
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start `command` bound to `binding` without waiting for it
    async fn launch(
        &self,
        command: &JobCommand,
        binding: ResourceBinding<'_>,
    ) -> GpuqResult<Box<dyn JobHandle>>;

    /// Get the launcher name
    fn name(&self) -> &'static str;
}
