//! gpuq-core: Core types for the gpuq slot scheduler
//!
//! This crate provides the fundamental types used throughout gpuq:
//! - Resource identifiers and slot status snapshots
//! - Job commands and job files
//! - Configuration types
//! - Error handling

pub mod config;
pub mod error;
pub mod job;
pub mod resource;

pub use config::*;
pub use error::*;
pub use job::*;
pub use resource::*;
