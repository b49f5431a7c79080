//! gpuq-runtime: Process launch layer
//!
//! This crate starts jobs for the scheduler:
//! - `Launcher` and `JobHandle` traits the scheduler is written against
//! - Process-based launcher built on `tokio::process`

pub mod process;
pub mod traits;

pub use process::{ProcessHandle, ProcessLauncher};
pub use traits::{JobHandle, Launcher, ResourceBinding};
