//! Configuration types for gpuq

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{GpuqError, GpuqResult, ResourceId};

/// Default resource-selection variable exported to jobs
pub const DEFAULT_ENV_VAR: &str = "CUDA_VISIBLE_DEVICES";

/// Default wait between two liveness checks, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 3.0;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuqConfig {
    /// Scheduler configuration
    pub scheduler: SchedulerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl GpuqConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> GpuqResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GpuqError::Config(format!("Failed to read config file: {}", e)))?;
        Ok(toml::from_str(&content)?)
    }
}

/// Slot scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Resource bound to each slot, in ring order; repeats oversubscribe a resource
    pub slots: Vec<ResourceId>,
    /// Seconds to sleep between two liveness checks
    pub poll_interval_secs: f64,
    /// Environment variable that carries the slot's resource to the job
    pub env_var: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slots: vec![ResourceId::from(0u32)],
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            env_var: DEFAULT_ENV_VAR.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Configuration for the given slots with every other field defaulted
    pub fn with_slots<I, R>(slots: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ResourceId>,
    {
        Self {
            slots: slots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Check the configuration can drive a scheduler
    pub fn validate(&self) -> GpuqResult<()> {
        if self.slots.is_empty() {
            return Err(GpuqError::Config(
                "at least one slot must be configured".to_string(),
            ));
        }
        self.poll_interval()?;
        if self.env_var.is_empty() {
            return Err(GpuqError::Config(
                "resource variable name must not be empty".to_string(),
            ));
        }
        if self.env_var.contains('=') || self.env_var.contains('\0') {
            return Err(GpuqError::Config(format!(
                "invalid resource variable name '{}'",
                self.env_var
            )));
        }
        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> GpuqResult<Duration> {
        if !(self.poll_interval_secs > 0.0) {
            return Err(GpuqError::Config(format!(
                "poll interval must be positive, got {}",
                self.poll_interval_secs
            )));
        }
        Duration::try_from_secs_f64(self.poll_interval_secs)
            .map_err(|e| GpuqError::Config(format!("invalid poll interval: {}", e)))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
