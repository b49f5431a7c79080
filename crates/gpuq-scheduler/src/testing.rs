//! In-memory launcher for scheduler tests

use async_trait::async_trait;
use gpuq_core::{GpuqError, GpuqResult, JobCommand, ResourceId};
use gpuq_runtime::{JobHandle, Launcher, ResourceBinding};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Running,
    Exited,
    CheckFails,
}

/// Shared switch deciding what a fake job reports
#[derive(Debug, Clone)]
pub struct JobControl(Arc<Mutex<JobState>>);

impl JobControl {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(JobState::Running)))
    }

    pub fn finish(&self) {
        *self.0.lock().unwrap() = JobState::Exited;
    }

    pub fn break_liveness_check(&self) {
        *self.0.lock().unwrap() = JobState::CheckFails;
    }

    pub fn handle(&self, pid: Option<u32>) -> Box<dyn JobHandle> {
        Box::new(FakeHandle {
            control: self.clone(),
            pid,
        })
    }
}

struct FakeHandle {
    control: JobControl,
    pid: Option<u32>,
}

impl JobHandle for FakeHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match *self.control.0.lock().unwrap() {
            JobState::Running => Ok(None),
            JobState::Exited => Ok(Some(ExitStatus::default())),
            JobState::CheckFails => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "wait failed",
            )),
        }
    }
}

/// Record of one launch
#[derive(Debug, Clone)]
pub struct FakeLaunch {
    pub program: String,
    pub env_var: String,
    pub resource: ResourceId,
    pub control: JobControl,
}

/// Launcher that hands out controllable fake jobs
///
/// Programs starting with `/missing/` fail to launch.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    launches: Arc<Mutex<Vec<FakeLaunch>>>,
}

impl FakeLauncher {
    pub fn launches(&self) -> Vec<FakeLaunch> {
        self.launches.lock().unwrap().clone()
    }

    pub fn control(&self, launch: usize) -> JobControl {
        self.launches.lock().unwrap()[launch].control.clone()
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(
        &self,
        command: &JobCommand,
        binding: ResourceBinding<'_>,
    ) -> GpuqResult<Box<dyn JobHandle>> {
        if command.program.starts_with("/missing/") {
            return Err(GpuqError::Launch {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let mut launches = self.launches.lock().unwrap();
        let control = JobControl::new();
        let pid = Some(1000 + launches.len() as u32);
        launches.push(FakeLaunch {
            program: command.program.clone(),
            env_var: binding.env_var.to_string(),
            resource: binding.resource.clone(),
            control: control.clone(),
        });
        Ok(control.handle(pid))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
