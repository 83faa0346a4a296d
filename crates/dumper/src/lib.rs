//! # Dumper
//!
//! Packet dumping node.
//!
//! Responsibilities:
//! - Accept packets from any number of producers without blocking them
//! - Name every packet from a compiled pattern
//! - Hand the payload to a pluggable dump strategy
//! - Honour pause/resume and cooperative cancellation
//! - Report incoming rate, work ratio and queue length
//!
//! ## Usage Example
//!
//! ```ignore
//! use dumper::{dump_to_file, PacketDumper};
//! use contracts::{NodeIdAllocator, Packet};
//!
//! let ids = NodeIdAllocator::new();
//! let node = PacketDumper::builder(ids.next_id(), "/out/pkt-{{count}}.raw")
//!     .strategy(Arc::new(dump_to_file))
//!     .build()?;
//!
//! node.start(&ctx)?;
//! node.send(Packet::new(0, 0, payload));
//! node.stop().await;
//! ```

pub mod dump;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod node;
pub mod queue;
pub mod stats;

pub use contracts::{DumpStrategy, NodeEvent, NodeState, Packet, PacketRef};
pub use dump::{dump_to_file, from_config, FileDump, LogDump};
pub use error::DumperError;
pub use gate::{GateControl, PauseGate};
pub use metrics::{DumperMetrics, MetricsSnapshot};
pub use node::{PacketDumper, PacketDumperBuilder};
pub use queue::PacketQueue;
pub use stats::DumperStats;
