//! PacketDumper - queue-driven dumping node

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    ContractError, EmitEventFn, NamingData, NodeEvent, NodeId, NodeMetadata, NodeState, Packet,
    PacketRef, SharedDumpStrategy,
};
use naming::NamingTemplate;
use observability::Stater;

use crate::dump::dump_to_file;
use crate::error::DumperError;
use crate::gate::{pause_gate, GateControl, PauseGate};
use crate::metrics::{DumperMetrics, MetricsSnapshot};
use crate::queue::PacketQueue;
use crate::stats::DumperStats;

/// Builder for creating a PacketDumper
pub struct PacketDumperBuilder {
    id: NodeId,
    pattern: String,
    strategy: Option<SharedDumpStrategy>,
    data: NamingData,
    emitter: Option<EmitEventFn>,
    stater: Option<Arc<Stater>>,
}

impl PacketDumperBuilder {
    /// Create a new builder for node `id` naming packets with `pattern`
    pub fn new(id: NodeId, pattern: impl Into<String>) -> Self {
        Self {
            id,
            pattern: pattern.into(),
            strategy: None,
            data: NamingData::new(),
            emitter: None,
            stater: None,
        }
    }

    /// Dump strategy (defaults to [`dump_to_file`])
    pub fn strategy(mut self, strategy: SharedDumpStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Static naming variables
    pub fn data(mut self, data: NamingData) -> Self {
        self.data = data;
        self
    }

    /// Event callback (defaults to discarding events)
    pub fn emitter(mut self, emitter: EmitEventFn) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Stats registry (defaults to a private one)
    pub fn stater(mut self, stater: Arc<Stater>) -> Self {
        self.stater = Some(stater);
        self
    }

    /// Compile the pattern, register stats and build the node
    ///
    /// # Errors
    /// `DumperError::Template` if the pattern does not compile.
    #[instrument(
        name = "pkt_dumper_build",
        skip(self),
        fields(id = %self.id, pattern = %self.pattern)
    )]
    pub fn build(self) -> Result<PacketDumper, DumperError> {
        let template = NamingTemplate::compile(&self.pattern).map_err(DumperError::Template)?;

        let id = self.id.get();
        let metadata = NodeMetadata {
            name: format!("pkt_dumper_{id}"),
            label: format!("Pkt dumper #{id}"),
            description: "Dump packets".to_string(),
        };

        let queue = PacketQueue::new();
        let stats = DumperStats::new();
        let stater = self.stater.unwrap_or_default();
        stats.register(&stater, &metadata.name, &queue);

        let strategy: SharedDumpStrategy = match self.strategy {
            Some(strategy) => strategy,
            None => Arc::new(dump_to_file),
        };
        let emitter: EmitEventFn = match self.emitter {
            Some(emitter) => emitter,
            None => Arc::new(|_: NodeEvent| {}),
        };
        let (gate_control, gate) = pause_gate();
        let gate_control = Arc::new(gate_control);
        let count = Arc::new(AtomicU64::new(0));
        let metrics = Arc::new(DumperMetrics::new());
        let cancel = CancellationToken::new();

        let dispatch = DispatchLoop {
            node: metadata.name.clone(),
            template: Arc::new(template),
            data: self.data,
            strategy,
            emitter,
            count: Arc::clone(&count),
            queue: queue.clone(),
            gate,
            gate_control: Arc::clone(&gate_control),
            stats,
            metrics: Arc::clone(&metrics),
            cancel: cancel.clone(),
        };

        debug!(node = %metadata.name, "pkt dumper created");

        Ok(PacketDumper {
            pattern: self.pattern,
            metadata,
            count,
            queue,
            metrics,
            gate: gate_control,
            cancel,
            dispatch: Mutex::new(Some(dispatch)),
            worker: Mutex::new(None),
        })
    }
}

/// Node that dumps every packet it receives
///
/// `send` may be called from any thread; the dispatch loop runs as one
/// tokio task once [`PacketDumper::start`] is called.
pub struct PacketDumper {
    pattern: String,
    metadata: NodeMetadata,
    count: Arc<AtomicU64>,
    queue: PacketQueue,
    metrics: Arc<DumperMetrics>,
    gate: Arc<GateControl>,
    cancel: CancellationToken,
    /// Taken on start
    dispatch: Mutex<Option<DispatchLoop>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PacketDumper {
    /// Create a builder
    pub fn builder(id: NodeId, pattern: impl Into<String>) -> PacketDumperBuilder {
        PacketDumperBuilder::new(id, pattern)
    }

    /// Create a node with every collaborator given explicitly
    pub fn new(
        id: NodeId,
        pattern: impl Into<String>,
        strategy: SharedDumpStrategy,
        data: NamingData,
        emitter: EmitEventFn,
        stater: Arc<Stater>,
    ) -> Result<Self, DumperError> {
        PacketDumperBuilder::new(id, pattern)
            .strategy(strategy)
            .data(data)
            .emitter(emitter)
            .stater(stater)
            .build()
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Packets dispatched so far
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> NodeState {
        self.gate.state()
    }

    /// Packets waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Start the dispatch loop on the current tokio runtime
    ///
    /// The loop stops when `ctx` is cancelled or [`PacketDumper::stop`] is called.
    pub fn start(&self, ctx: &CancellationToken) -> Result<(), DumperError> {
        let runtime = Handle::try_current().map_err(|_| DumperError::no_runtime(self.name()))?;
        self.start_on(ctx, &runtime)
    }

    /// Start the dispatch loop on `runtime`
    #[instrument(name = "pkt_dumper_start", skip_all, fields(node = %self.metadata.name))]
    pub fn start_on(&self, ctx: &CancellationToken, runtime: &Handle) -> Result<(), DumperError> {
        if self.cancel.is_cancelled() {
            return Err(DumperError::stopped(self.name()));
        }
        let dispatch = self
            .dispatch
            .lock()
            .take()
            .ok_or_else(|| DumperError::already_started(self.name()))?;

        // Propagate framework cancellation to the node without tying the
        // node's own token to the parent.
        let parent = ctx.clone();
        let cancel = self.cancel.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = parent.cancelled() => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        });

        let handle = runtime.spawn(dispatch.run());
        *self.worker.lock() = Some(handle);

        info!(node = %self.metadata.name, pattern = %self.pattern, "Pkt dumper started");
        Ok(())
    }

    /// Submit a packet for asynchronous dumping
    ///
    /// Never blocks. Returns false if the node has stopped.
    pub fn send(&self, packet: Packet) -> bool {
        match self.queue.send(packet) {
            Ok(()) => true,
            Err(packet) => {
                discard(&self.metrics, self.name(), 1);
                debug!(
                    node = %self.metadata.name,
                    pts = packet.pts,
                    "Queue stopped, packet discarded"
                );
                false
            }
        }
    }

    /// Copy a borrowed packet and submit it
    pub fn handle_packet(&self, packet: PacketRef<'_>) -> bool {
        self.send(packet.to_owned_packet())
    }

    /// Hold dispatch before the next packet
    pub fn pause(&self) -> bool {
        self.gate.pause()
    }

    /// Release a paused node
    pub fn resume(&self) -> bool {
        self.gate.resume()
    }

    /// Stop the node
    ///
    /// Waits for the packet in flight, if any. Queued packets are dropped.
    /// Calling it again has no effect.
    #[instrument(name = "pkt_dumper_stop", skip(self), fields(node = %self.metadata.name))]
    pub async fn stop(&self) {
        self.gate.stop();
        self.cancel.cancel();

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!(node = %self.metadata.name, error = ?e, "Dispatch loop panicked");
            }
        }

        // Covers a node stopped before it ever started.
        discard(&self.metrics, self.name(), self.queue.close() as u64);
    }
}

impl Drop for PacketDumper {
    fn drop(&mut self) {
        self.gate.stop();
        self.cancel.cancel();
    }
}

/// Consumer side of the node, moved into its own task on start
struct DispatchLoop {
    node: String,
    template: Arc<NamingTemplate>,
    /// Written only here
    data: NamingData,
    strategy: SharedDumpStrategy,
    emitter: EmitEventFn,
    count: Arc<AtomicU64>,
    queue: PacketQueue,
    gate: PauseGate,
    gate_control: Arc<GateControl>,
    stats: DumperStats,
    metrics: Arc<DumperMetrics>,
    cancel: CancellationToken,
}

impl DispatchLoop {
    #[instrument(name = "pkt_dumper_loop", skip(self), fields(node = %self.node))]
    async fn run(mut self) {
        info!(node = %self.node, "Dispatch loop started");
        self.emit(NodeEvent::Started {
            node: self.node.clone(),
        });

        while let Some(packet) = self.queue.recv(&self.cancel).await {
            if !self.gate.wait(&self.cancel).await {
                discard(&self.metrics, &self.node, 1);
                break;
            }
            self.handle(packet).await;
        }

        self.gate_control.stop();
        let discarded = self.queue.close() as u64;
        if discarded > 0 {
            discard(&self.metrics, &self.node, discarded);
            warn!(node = %self.node, discarded, "Queued packets dropped on stop");
        }

        info!(
            node = %self.node,
            count = self.count.load(Ordering::SeqCst),
            "Dispatch loop stopped"
        );
        self.emit(NodeEvent::Stopped {
            node: self.node.clone(),
        });
    }

    async fn handle(&mut self, packet: Packet) {
        self.stats.incoming_rate.add(1);
        self.metrics.inc_received();
        observability::record_packet_received(&self.node);

        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        naming::item_variables(&mut self.data, count, &packet);

        self.stats.work_ratio.begin();
        let destination = match self.template.render(&self.data) {
            Ok(destination) => destination,
            Err(e) => {
                self.stats.work_ratio.done();
                self.metrics.inc_render_failures();
                observability::record_render_failure(&self.node);
                error!(node = %self.node, count, error = %e, "Naming failed, packet dropped");
                self.emit(NodeEvent::RenderFailed {
                    node: self.node.clone(),
                    pattern: self.template.pattern().to_string(),
                    data: self.data.clone(),
                    error: Arc::new(e),
                });
                return;
            }
        };
        self.stats.work_ratio.done();

        self.stats.work_ratio.begin();
        let result = self.dump(packet, &destination).await;
        self.stats.work_ratio.done();

        match result {
            Ok(()) => {
                self.metrics.inc_dumped();
                observability::record_packet_dumped(&self.node, true);
                debug!(node = %self.node, count, destination = %destination, "Packet dumped");
            }
            Err(e) => {
                self.metrics.inc_dump_failures();
                observability::record_packet_dumped(&self.node, false);
                error!(
                    node = %self.node,
                    count,
                    destination = %destination,
                    error = %e,
                    "Dump failed, packet dropped"
                );
                self.emit(NodeEvent::DumpFailed {
                    node: self.node.clone(),
                    pattern: self.template.pattern().to_string(),
                    destination,
                    error: Arc::new(e),
                });
            }
        }
    }

    /// Run the strategy on a blocking thread; a panic counts as a failure
    async fn dump(&self, packet: Packet, destination: &str) -> Result<(), ContractError> {
        let strategy = Arc::clone(&self.strategy);
        let target = destination.to_string();
        tokio::task::spawn_blocking(move || strategy.dump(&packet, &target))
            .await
            .unwrap_or_else(|e| {
                Err(ContractError::dump(
                    destination,
                    format!("dump strategy panicked: {e}"),
                ))
            })
    }

    fn emit(&self, event: NodeEvent) {
        (self.emitter)(event);
    }
}

/// Count packets that never reach the strategy
fn discard(metrics: &DumperMetrics, node: &str, count: u64) {
    if count == 0 {
        return;
    }
    metrics.add_discarded(count);
    observability::record_packet_discarded(node, count);
}
