//! Node stats registered with the external stats registry

use std::sync::Arc;

use observability::{DurationRatioStat, GaugeStat, IncrementStat, StatMetadata, Stater};

use crate::queue::PacketQueue;

/// Incoming rate and work ratio of one node
#[derive(Debug, Clone)]
pub struct DumperStats {
    pub incoming_rate: Arc<IncrementStat>,
    pub work_ratio: Arc<DurationRatioStat>,
}

impl DumperStats {
    pub fn new() -> Self {
        Self {
            incoming_rate: Arc::new(IncrementStat::new()),
            work_ratio: Arc::new(DurationRatioStat::new()),
        }
    }

    /// Register the node's stats, plus the queue length, under `node`
    pub fn register(&self, stater: &Stater, node: &str, queue: &PacketQueue) {
        stater.add_stat(
            StatMetadata::new(format!("{node}.incoming_rate"), "Incoming rate", "pps")
                .with_description("Number of packets coming in the pkt dumper per second"),
            self.incoming_rate.clone(),
        );
        stater.add_stat(
            StatMetadata::new(format!("{node}.work_ratio"), "Work ratio", "%")
                .with_description("Percentage of time spent doing some actual work"),
            self.work_ratio.clone(),
        );

        let queue = queue.clone();
        stater.add_stat(
            StatMetadata::new(format!("{node}.queue_length"), "Queue length", "packets")
                .with_description("Number of packets waiting to be dumped"),
            Arc::new(GaugeStat::new(move || queue.len() as f64)),
        );
    }
}

impl Default for DumperStats {
    fn default() -> Self {
        Self::new()
    }
}
