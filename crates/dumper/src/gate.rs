//! Pause gate
//!
//! The node state lives in a watch channel. The control side is held by the
//! node handle, the gate side by the dispatch loop.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use contracts::NodeState;

/// Create a connected control/gate pair, starting in `Running`
pub fn pause_gate() -> (GateControl, PauseGate) {
    let (tx, rx) = watch::channel(NodeState::Running);
    (GateControl { tx }, PauseGate { rx })
}

/// Drives state transitions
#[derive(Debug)]
pub struct GateControl {
    tx: watch::Sender<NodeState>,
}

impl GateControl {
    /// Running -> Paused. Returns true if the state changed.
    pub fn pause(&self) -> bool {
        self.transition(NodeState::pause)
    }

    /// Paused -> Running. Returns true if the state changed.
    pub fn resume(&self) -> bool {
        self.transition(NodeState::resume)
    }

    /// Any -> Stopped (terminal). Returns true if the state changed.
    pub fn stop(&self) -> bool {
        self.transition(|_| NodeState::Stopped)
    }

    pub fn state(&self) -> NodeState {
        *self.tx.borrow()
    }

    fn transition(&self, next: impl FnOnce(NodeState) -> NodeState) -> bool {
        self.tx.send_if_modified(|state| {
            let from = *state;
            let to = next(from);
            if to == from {
                return false;
            }
            debug!(from = ?from, to = ?to, "node state changed");
            *state = to;
            true
        })
    }
}

/// Suspension point used by the dispatch loop
#[derive(Debug)]
pub struct PauseGate {
    rx: watch::Receiver<NodeState>,
}

impl PauseGate {
    /// Wait until the node may process the next packet
    ///
    /// Returns `true` when running, `false` when stopped, cancelled, or the
    /// control side is gone.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            match *self.rx.borrow_and_update() {
                NodeState::Running => return true,
                NodeState::Stopped => return false,
                NodeState::Paused => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}
