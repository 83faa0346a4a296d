//! Run statistics.

use std::time::Duration;

use dumper::MetricsSnapshot;
use observability::StatsAggregator;

/// Statistics from a single run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Node name
    pub node: String,

    /// Number of input files
    pub inputs: usize,

    /// Packets handed to the node
    pub packets_sent: u64,

    /// Whether the run stopped before every packet was handled
    pub timed_out: bool,

    /// Node counters at stop
    pub metrics: MetricsSnapshot,

    /// Total duration of the run
    pub duration: Duration,

    /// Periodic stat aggregates
    pub stats: StatsAggregator,
}

impl RunStats {
    /// Dumped packets per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.dumped as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pkt Dumper Statistics ({}) ===\n", self.node);

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Inputs: {}", self.inputs);
        println!("   ├─ Packets sent: {}", self.packets_sent);
        println!("   ├─ Packets dumped: {}", self.metrics.dumped);
        println!("   ├─ Naming failures: {}", self.metrics.render_failures);
        println!("   ├─ Dump failures: {}", self.metrics.dump_failures);
        println!("   ├─ Discarded: {}", self.metrics.discarded);
        println!("   └─ Throughput: {:.2} pkt/s", self.throughput());

        if self.timed_out {
            println!("\n⚠ Stopped before every packet was handled");
        }

        if !self.stats.is_empty() {
            println!("\nStats");
            let summary = self.stats.summary();
            let last = summary.len().saturating_sub(1);
            for (i, (name, stat)) in summary.iter().enumerate() {
                let branch = if i == last { "└─" } else { "├─" };
                println!("   {} {}: {}", branch, name, stat);
            }
        }

        println!();
    }
}
