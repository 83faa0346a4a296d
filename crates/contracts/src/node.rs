//! Node identity and lifecycle state
//!
//! Identifiers are handed out by an allocator owned by whoever builds nodes,
//! so two independent pipelines never share a counter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap an externally assigned identifier
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing [`NodeId`]s starting at 1
#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    last: AtomicU64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier
    pub fn next_id(&self) -> NodeId {
        NodeId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Human-facing node description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Unique machine name (used in logs/metrics labels)
    pub name: String,

    /// Display label
    pub label: String,

    /// What the node does
    pub description: String,
}

/// Node run state
///
/// `Running <-> Paused` on external command; either goes to `Stopped` on
/// cancellation, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Running,
    Paused,
    Stopped,
}

impl NodeState {
    /// Apply a pause command. Returns the new state.
    pub fn pause(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            other => other,
        }
    }

    /// Apply a resume command. Returns the new state.
    pub fn resume(self) -> Self {
        match self {
            Self::Paused => Self::Running,
            other => other,
        }
    }

    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }
}
