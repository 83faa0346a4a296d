//! DumpStrategy trait - dumper output interface
//!
//! Defines the abstract interface for persisting or forwarding a packet.

use std::sync::Arc;

use crate::{ContractError, Packet};

/// Packet dump strategy
///
/// Called synchronously from the dispatch loop (on a blocking thread), so
/// implementations may perform blocking I/O. Strategies should hold no
/// mutable shared state; one instance may serve several nodes.
///
/// Any `Fn(&Packet, &str) -> Result<(), ContractError>` is a strategy.
pub trait DumpStrategy: Send + Sync {
    /// Strategy name (used for logging)
    fn name(&self) -> &str {
        "custom"
    }

    /// Dump `packet` to `destination`
    ///
    /// # Errors
    /// Returns dump error (should include the destination)
    fn dump(&self, packet: &Packet, destination: &str) -> Result<(), ContractError>;
}

impl<F> DumpStrategy for F
where
    F: Fn(&Packet, &str) -> Result<(), ContractError> + Send + Sync,
{
    fn dump(&self, packet: &Packet, destination: &str) -> Result<(), ContractError> {
        self(packet, destination)
    }
}

/// Shared strategy handle
pub type SharedDumpStrategy = Arc<dyn DumpStrategy>;
