//! Process-based launcher implementation
//!
//! Jobs run as direct OS child processes. Each child inherits the caller's
//! environment and stdio, with the slot's resource exported through the
//! configured variable. Children are detached: dropping a handle does not
//! kill the process.

use async_trait::async_trait;
use gpuq_core::{GpuqError, GpuqResult, JobCommand};
use std::path::PathBuf;
use std::process::ExitStatus;
use tokio::process::{Child, Command};
use tracing::{debug, error};

use crate::traits::{JobHandle, Launcher, ResourceBinding};

/// Process launcher configuration
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncherConfig {
    /// Working directory for jobs; the caller's when unset
    pub working_dir: Option<PathBuf>,
}

/// Launches jobs as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    config: ProcessLauncherConfig,
}

impl ProcessLauncher {
    /// Create a new process launcher
    pub fn new(config: ProcessLauncherConfig) -> Self {
        Self { config }
    }

    /// Build the command for a job
    fn build_command(&self, command: &JobCommand, binding: ResourceBinding<'_>) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        // Inherited environment plus the resource override
        cmd.env(binding.env_var, binding.resource.as_str());

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        cmd.kill_on_drop(false);
        cmd
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        command: &JobCommand,
        binding: ResourceBinding<'_>,
    ) -> GpuqResult<Box<dyn JobHandle>> {
        let mut cmd = self.build_command(command, binding);

        match cmd.spawn() {
            Ok(child) => {
                let pid = child.id();
                debug!(
                    program = %command.program,
                    pid = ?pid,
                    "Job process spawned"
                );
                Ok(Box::new(ProcessHandle { child, pid }))
            }
            Err(e) => {
                error!(
                    program = %command.program,
                    error = %e,
                    "Failed to spawn job process"
                );
                Err(GpuqError::Launch {
                    program: command.program.clone(),
                    source: e,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Handle to a job running as a child process
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
}

impl JobHandle for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use gpuq_core::ResourceId;
    use std::time::Duration;

    async fn wait_for_exit(handle: &mut Box<dyn JobHandle>) -> ExitStatus {
        for _ in 0..500 {
            if let Some(status) = handle.try_wait().unwrap() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not exit");
    }

    #[tokio::test]
    async fn test_launch_exports_resource() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("device");
        let launcher = ProcessLauncher::default();
        let resource = ResourceId::from("7");

        let command = JobCommand::new(
            "sh",
            [
                "-c".to_string(),
                format!("printf %s \"$GPUQ_TEST_DEVICE\" > '{}'", out.display()),
            ],
        );
        let binding = ResourceBinding {
            env_var: "GPUQ_TEST_DEVICE",
            resource: &resource,
        };

        let mut handle = launcher.launch(&command, binding).await.unwrap();
        assert!(handle.pid().is_some());

        let status = wait_for_exit(&mut handle).await;
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "7");
    }

    #[tokio::test]
    async fn test_launch_inherits_environment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("path");
        let launcher = ProcessLauncher::default();
        let resource = ResourceId::from("0");

        let command = JobCommand::new(
            "sh",
            [
                "-c".to_string(),
                format!("printf %s \"$PATH\" > '{}'", out.display()),
            ],
        );
        let binding = ResourceBinding {
            env_var: "GPUQ_TEST_DEVICE",
            resource: &resource,
        };

        let mut handle = launcher.launch(&command, binding).await.unwrap();
        wait_for_exit(&mut handle).await;

        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), path);
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(ProcessLauncherConfig {
            working_dir: Some(dir.path().to_path_buf()),
        });
        let resource = ResourceId::from("0");
        let command = JobCommand::new("sh", ["-c", "touch created-here"]);
        let binding = ResourceBinding {
            env_var: "GPUQ_TEST_DEVICE",
            resource: &resource,
        };

        let mut handle = launcher.launch(&command, binding).await.unwrap();
        wait_for_exit(&mut handle).await;
        assert!(dir.path().join("created-here").exists());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported_as_exited() {
        let launcher = ProcessLauncher::default();
        let resource = ResourceId::from("0");
        let command = JobCommand::new("sh", ["-c", "exit 3"]);
        let binding = ResourceBinding {
            env_var: "GPUQ_TEST_DEVICE",
            resource: &resource,
        };

        let mut handle = launcher.launch(&command, binding).await.unwrap();
        let status = wait_for_exit(&mut handle).await;
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let launcher = ProcessLauncher::default();
        let resource = ResourceId::from("0");
        let command = JobCommand::new("/nonexistent/gpuq-test-binary", Vec::<String>::new());
        let binding = ResourceBinding {
            env_var: "GPUQ_TEST_DEVICE",
            resource: &resource,
        };

        let err = match launcher.launch(&command, binding).await {
            Ok(_) => panic!("missing program was launched"),
            Err(e) => e,
        };
        assert!(err.is_launch_failure());
        assert_eq!(launcher.name(), "process");
    }
}
