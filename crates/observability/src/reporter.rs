//! Periodic stats reporter
//!
//! Samples every stat registered with a [`Stater`] at a fixed interval,
//! publishes the values as gauges and keeps running aggregates.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::{record_stat_sample, StatsAggregator};
use crate::stats::Stater;

/// Stats reporter task
pub struct StatsReporter {
    stater: Arc<Stater>,
    period: Duration,
    aggregator: StatsAggregator,
}

impl StatsReporter {
    pub fn new(stater: Arc<Stater>, period: Duration) -> Self {
        Self {
            stater,
            period,
            aggregator: StatsAggregator::new(),
        }
    }

    /// Take one sample of every stat
    pub fn tick(&mut self) {
        let samples = self.stater.sample_all();
        for sample in &samples {
            record_stat_sample(sample);
            debug!(
                stat = %sample.metadata.name,
                value = format!("{:.2}", sample.value),
                unit = %sample.metadata.unit,
                "stat sampled"
            );
        }
        self.aggregator.update(&samples);
    }

    /// Run until cancellation and return the aggregates
    ///
    /// Spawn this as a tokio task.
    pub async fn run(mut self, cancel: CancellationToken) -> StatsAggregator {
        info!(period_ms = self.period.as_millis() as u64, "stats reporter started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip the empty window.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick(),
            }
        }

        info!("stats reporter stopped");
        self.aggregator
    }
}
