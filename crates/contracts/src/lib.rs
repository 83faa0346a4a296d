//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Ownership Model
//! - Producers hand packets in either as an owned [`Packet`] (zero-copy `Bytes`)
//!   or as a borrowed [`PacketRef`] that is copied at enqueue time
//! - Naming variables ([`NamingData`]) belong to the dispatch loop once a node starts

mod config;
mod dump;
mod error;
mod event;
mod node;
mod packet;

pub use config::*;
pub use dump::{DumpStrategy, SharedDumpStrategy};
pub use error::*;
pub use event::{EmitEventFn, NodeEvent};
pub use node::{NodeId, NodeIdAllocator, NodeMetadata, NodeState};
pub use packet::{NamingData, Packet, PacketRef};
