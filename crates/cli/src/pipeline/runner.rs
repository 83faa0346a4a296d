//! Runner - feeds input files through one dumper node.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DumperConfig, NodeEvent, NodeIdAllocator, PacketRef};
use dumper::PacketDumper;
use observability::{StatsAggregator, StatsReporter, Stater};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::RunStats;
use crate::error::CliError;

/// Static variable holding `--output-dir`
pub const VAR_OUTPUT_DIR: &str = "outputDir";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Loaded dumper configuration
    pub dumper: DumperConfig,

    /// Input files, in stream index order
    pub inputs: Vec<PathBuf>,

    /// Packet size in bytes
    pub chunk_size: usize,

    /// Exposed as `outputDir`
    pub output_dir: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// How long to wait for queued packets (None = forever)
    pub timeout: Option<Duration>,
}

/// Drives a single run
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Feed every input, wait for the node to drain, and stop it
    ///
    /// Cancelling `shutdown` stops feeding and waiting early.
    pub async fn run(self, shutdown: CancellationToken) -> Result<RunStats> {
        let start_time = Instant::now();
        let config = self.config;

        if config.chunk_size == 0 {
            return Err(CliError::invalid_argument("chunk-size", "must be > 0").into());
        }

        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let mut data = config.dumper.node.data.clone();
        if let Some(dir) = &config.output_dir {
            data.insert(
                VAR_OUTPUT_DIR.to_string(),
                dir.display().to_string().into(),
            );
        }

        let stater = Arc::new(Stater::new());
        let ids = NodeIdAllocator::new();
        let node = PacketDumper::builder(ids.next_id(), config.dumper.node.pattern.as_str())
            .strategy(dumper::from_config(&config.dumper.dump))
            .data(data)
            .emitter(Arc::new(log_event))
            .stater(Arc::clone(&stater))
            .build()
            .map_err(CliError::from)?;

        node.start(&shutdown).map_err(CliError::from)?;

        // Spawned only once the node runs, so every later exit cancels it.
        let reporter_cancel = CancellationToken::new();
        let reporter = config.dumper.stats.enabled.then(|| {
            let period = Duration::from_millis(config.dumper.stats.interval_ms);
            let reporter = StatsReporter::new(Arc::clone(&stater), period);
            tokio::spawn(reporter.run(reporter_cancel.clone()))
        });

        let sent = match feed(&node, &config.inputs, config.chunk_size, &shutdown).await {
            Ok(sent) => sent,
            Err(e) => {
                node.stop().await;
                reporter_cancel.cancel();
                return Err(e);
            }
        };
        info!(node = %node.name(), sent, "All inputs submitted");

        let drained = wait_drained(&node, sent, config.timeout, &shutdown).await;
        if !drained {
            warn!(
                node = %node.name(),
                pending = node.pending(),
                "Stopping before every packet was dumped"
            );
        }

        node.stop().await;
        reporter_cancel.cancel();
        let stats = match reporter {
            Some(handle) => handle.await.context("Stats reporter task failed")?,
            None => StatsAggregator::new(),
        };

        Ok(RunStats {
            node: node.name().to_string(),
            inputs: config.inputs.len(),
            packets_sent: sent,
            timed_out: !drained,
            metrics: node.metrics(),
            duration: start_time.elapsed(),
            stats,
        })
    }
}

/// Cut every input into packets and submit them
///
/// Stream index is the input position, pts the chunk index within it.
async fn feed(
    node: &PacketDumper,
    inputs: &[PathBuf],
    chunk_size: usize,
    shutdown: &CancellationToken,
) -> Result<u64> {
    let mut sent = 0u64;
    for (stream_index, path) in inputs.iter().enumerate() {
        if shutdown.is_cancelled() {
            break;
        }
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| CliError::input(path, e))?;

        let mut chunks = 0u64;
        for (pts, chunk) in content.chunks(chunk_size).enumerate() {
            if !node.handle_packet(PacketRef::new(pts as i64, stream_index, chunk)) {
                return Ok(sent);
            }
            sent += 1;
            chunks += 1;
        }
        debug!(input = %path.display(), stream_index, chunks, "Input submitted");
    }
    Ok(sent)
}

/// Wait until `expected` packets have been handled
///
/// Returns false on timeout or shutdown.
async fn wait_drained(
    node: &PacketDumper,
    expected: u64,
    timeout: Option<Duration>,
    shutdown: &CancellationToken,
) -> bool {
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        if node.metrics().completed() >= expected {
            return true;
        }
        if shutdown.is_cancelled() {
            return false;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return false;
        }
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = sleep(POLL_INTERVAL) => {}
        }
    }
}

fn log_event(event: NodeEvent) {
    match &event {
        NodeEvent::Started { node } => debug!(node = %node, "node started"),
        NodeEvent::Stopped { node } => debug!(node = %node, "node stopped"),
        NodeEvent::RenderFailed { node, error, .. } | NodeEvent::DumpFailed { node, error, .. } => {
            warn!(node = %node, error = %error, "node reported an error")
        }
    }
}
