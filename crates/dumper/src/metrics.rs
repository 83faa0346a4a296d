//! Dumper metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters for a single node
#[derive(Debug, Default)]
pub struct DumperMetrics {
    /// Packets that reached the dispatch step
    received: AtomicU64,
    /// Successful dumps
    dumped: AtomicU64,
    /// Packets dropped because the name could not be rendered
    render_failures: AtomicU64,
    /// Packets dropped because the strategy failed
    dump_failures: AtomicU64,
    /// Packets never dispatched (sent after stop, or left queued at stop)
    discarded: AtomicU64,
}

impl DumperMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dumped(&self) {
        self.dumped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_render_failures(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dump_failures(&self) {
        self.dump_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dumped: self.dumped.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            dump_failures: self.dump_failures.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of node metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub dumped: u64,
    pub render_failures: u64,
    pub dump_failures: u64,
    pub discarded: u64,
}

impl MetricsSnapshot {
    /// Packets whose handling finished, successfully or not
    pub fn completed(&self) -> u64 {
        self.dumped + self.render_failures + self.dump_failures
    }

    pub fn failures(&self) -> u64 {
        self.render_failures + self.dump_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_totals() {
        let metrics = DumperMetrics::new();
        metrics.inc_received();
        metrics.inc_received();
        metrics.inc_received();
        metrics.inc_dumped();
        metrics.inc_render_failures();
        metrics.inc_dump_failures();
        metrics.add_discarded(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 3);
        assert_eq!(snapshot.completed(), 3);
        assert_eq!(snapshot.failures(), 2);
        assert_eq!(snapshot.discarded, 4);
    }
}
