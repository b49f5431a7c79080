//! gpuq-scheduler: Round-robin slot scheduler
//!
//! This crate multiplexes a fixed ring of resource slots among jobs:
//! - Slot table with a wrapping cursor
//! - Blocking submission and drain on top of a pluggable launcher

pub mod scheduler;
pub mod slot_table;

#[cfg(test)]
mod testing;

pub use scheduler::SlotScheduler;
pub use slot_table::{RunningJob, SlotTable};
