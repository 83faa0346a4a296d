//! PacketQueue - unbounded ingestion queue
//!
//! Many producers, one consumer. `send` never blocks; the consumer side
//! observes a cancellation token while waiting.

use async_channel::{unbounded, Receiver, Sender, TrySendError};
use tokio_util::sync::CancellationToken;

use contracts::Packet;

/// Ingestion queue shared by producers and the dispatch loop
#[derive(Debug, Clone)]
pub struct PacketQueue {
    tx: Sender<Packet>,
    rx: Receiver<Packet>,
}

impl PacketQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Enqueue a packet without blocking
    ///
    /// Returns the packet back if the queue has been closed.
    pub fn send(&self, packet: Packet) -> Result<(), Packet> {
        match self.tx.try_send(packet) {
            Ok(()) => Ok(()),
            // Unbounded: only reachable if a capacity is ever introduced.
            Err(TrySendError::Full(packet)) | Err(TrySendError::Closed(packet)) => Err(packet),
        }
    }

    /// Wait for the next packet
    ///
    /// Returns `None` once `cancel` fires or the queue is closed and empty.
    /// Cancellation wins over a ready packet.
    pub async fn recv(&self, cancel: &CancellationToken) -> Option<Packet> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            packet = self.rx.recv() => packet.ok(),
        }
    }

    /// Packets waiting to be dispatched
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop accepting packets and drop whatever is still queued
    ///
    /// Returns the number of packets dropped. Calling it again returns 0.
    pub fn close(&self) -> usize {
        self.tx.close();
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}
