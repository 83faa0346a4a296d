//! NodeEvent - events reported to the enclosing pipeline

use std::sync::Arc;

use crate::{ContractError, NamingData};

/// Event emission callback
///
/// Supplied by the enclosing framework at node construction.
/// Uses `Arc` so the dispatch loop and the node handle can share it.
pub type EmitEventFn = Arc<dyn Fn(NodeEvent) + Send + Sync>;

/// Structured node event
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// Dispatch loop started
    Started { node: String },

    /// Dispatch loop exited
    Stopped { node: String },

    /// Naming pattern could not be rendered; the packet was dropped
    RenderFailed {
        node: String,
        pattern: String,
        /// Naming variables at failure time
        data: NamingData,
        error: Arc<ContractError>,
    },

    /// Dump strategy failed; the packet was dropped
    DumpFailed {
        node: String,
        pattern: String,
        /// Rendered destination
        destination: String,
        error: Arc<ContractError>,
    },
}

impl NodeEvent {
    /// Name of the node that emitted the event
    pub fn node(&self) -> &str {
        match self {
            Self::Started { node }
            | Self::Stopped { node }
            | Self::RenderFailed { node, .. }
            | Self::DumpFailed { node, .. } => node,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::RenderFailed { .. } | Self::DumpFailed { .. })
    }

    /// Underlying cause for error events
    pub fn error(&self) -> Option<&ContractError> {
        match self {
            Self::RenderFailed { error, .. } | Self::DumpFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}
