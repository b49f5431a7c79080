//! Resource identifiers and slot status snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GpuqError, GpuqResult};

/// Opaque token handed to a job through the resource-selection variable
///
/// Usually a device index such as `0` or `3`, but any string is accepted.
/// Configuration files may write identifiers as integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawResourceId", into = "String")]
pub struct ResourceId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResourceId {
    Int(i64),
    Str(String),
}

impl From<RawResourceId> for ResourceId {
    fn from(raw: RawResourceId) -> Self {
        match raw {
            RawResourceId::Int(n) => ResourceId(n.to_string()),
            RawResourceId::Str(s) => ResourceId(s),
        }
    }
}

impl ResourceId {
    /// Create a resource identifier from its string form
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    /// String form, as exported to the job environment
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma-separated list such as `0,1,1,2`
    pub fn parse_list(list: &str) -> GpuqResult<Vec<ResourceId>> {
        list.split(',')
            .map(str::trim)
            .map(|item| {
                if item.is_empty() {
                    Err(GpuqError::Config(format!(
                        "Empty entry in slot list '{}'",
                        list
                    )))
                } else {
                    Ok(ResourceId::new(item))
                }
            })
            .collect()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId(id)
    }
}

impl From<u32> for ResourceId {
    fn from(index: u32) -> Self {
        ResourceId(index.to_string())
    }
}

impl From<usize> for ResourceId {
    fn from(index: usize) -> Self {
        ResourceId(index.to_string())
    }
}

/// Point-in-time view of one slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatus {
    /// Position of the slot in the ring
    pub index: usize,
    /// Resource bound to the slot
    pub resource: ResourceId,
    /// Job currently occupying the slot, if any
    pub job: Option<SlotJob>,
}

impl SlotStatus {
    /// Whether a job is running in the slot
    pub fn is_occupied(&self) -> bool {
        self.job.is_some()
    }
}

/// The job held by an occupied slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotJob {
    /// Job identifier assigned at launch
    pub id: Uuid,
    /// OS process id, when the platform reports one
    pub pid: Option<u32>,
    /// Program that was launched
    pub program: String,
    /// Launch timestamp
    pub started_at: DateTime<Utc>,
}
