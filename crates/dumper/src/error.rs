//! Dumper error types

use thiserror::Error;

/// Dumper-specific errors
#[derive(Debug, Error)]
pub enum DumperError {
    /// Naming pattern failed to compile; the node was not created
    #[error("pkt dumper: {0}")]
    Template(#[source] contracts::ContractError),

    /// `start` called on a node that already started
    #[error("node '{node}' already started")]
    AlreadyStarted { node: String },

    /// `start` called after `stop`
    #[error("node '{node}' has been stopped")]
    Stopped { node: String },

    /// `start` called outside a tokio runtime
    #[error("node '{node}' cannot start outside a tokio runtime")]
    NoRuntime { node: String },

    /// Contract error
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DumperError {
    pub fn already_started(node: impl Into<String>) -> Self {
        Self::AlreadyStarted { node: node.into() }
    }

    pub fn stopped(node: impl Into<String>) -> Self {
        Self::Stopped { node: node.into() }
    }

    pub fn no_runtime(node: impl Into<String>) -> Self {
        Self::NoRuntime { node: node.into() }
    }
}
