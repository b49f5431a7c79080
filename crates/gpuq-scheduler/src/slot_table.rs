//! Slot table: a fixed ring of resource slots with a round-robin cursor

use chrono::{DateTime, Utc};
use gpuq_core::{GpuqError, GpuqResult, ResourceId, SlotJob, SlotStatus};
use gpuq_runtime::JobHandle;
use uuid::Uuid;

/// Job occupying a slot
pub struct RunningJob {
    /// Identifier assigned at launch
    pub id: Uuid,
    /// Program that was launched
    pub program: String,
    /// Launch timestamp
    pub started_at: DateTime<Utc>,
    /// Handle used for liveness checks
    pub handle: Box<dyn JobHandle>,
}

struct Slot {
    resource: ResourceId,
    job: Option<RunningJob>,
}

/// Ring of slots, each holding at most one job
///
/// The cursor always stays within `0..len()`.
pub struct SlotTable {
    slots: Vec<Slot>,
    cursor: usize,
}

impl SlotTable {
    /// Create a table with one empty slot per resource, cursor at 0
    pub fn new(resources: Vec<ResourceId>) -> GpuqResult<Self> {
        if resources.is_empty() {
            return Err(GpuqError::Config(
                "slot table needs at least one slot".to_string(),
            ));
        }

        Ok(Self {
            slots: resources
                .into_iter()
                .map(|resource| Slot {
                    resource,
                    job: None,
                })
                .collect(),
            cursor: 0,
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a table has at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot the cursor points at
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to the next slot, wrapping around
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Resource bound to a slot
    pub fn resource(&self, index: usize) -> Option<&ResourceId> {
        self.slots.get(index).map(|s| &s.resource)
    }

    /// Whether the slot under the cursor is empty
    pub fn cursor_is_free(&self) -> bool {
        self.slots[self.cursor].job.is_none()
    }

    /// Job under the cursor, if any
    pub fn cursor_job_mut(&mut self) -> Option<&mut RunningJob> {
        self.slots[self.cursor].job.as_mut()
    }

    /// Place a job in the slot under the cursor
    ///
    /// Returns the job back if the slot is already taken.
    pub fn occupy_cursor(&mut self, job: RunningJob) -> Result<(), RunningJob> {
        let slot = &mut self.slots[self.cursor];
        if slot.job.is_some() {
            return Err(job);
        }
        slot.job = Some(job);
        Ok(())
    }

    /// Empty the slot under the cursor
    pub fn release_cursor(&mut self) -> Option<RunningJob> {
        self.slots[self.cursor].job.take()
    }

    /// True when no slot holds a job
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|s| s.job.is_none())
    }

    /// Number of slots holding a job
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.job.is_some()).count()
    }

    /// Snapshot of every slot
    pub fn snapshot(&self) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotStatus {
                index,
                resource: slot.resource.clone(),
                job: slot.job.as_ref().map(|job| SlotJob {
                    id: job.id,
                    pid: job.handle.pid(),
                    program: job.program.clone(),
                    started_at: job.started_at,
                }),
            })
            .collect()
    }
}
