//! LogDump - logs packet summaries via tracing

use contracts::{ContractError, DumpStrategy, Packet};
use tracing::info;

/// Strategy that logs what would be dumped and writes nothing
#[derive(Debug, Clone, Default)]
pub struct LogDump;

impl LogDump {
    pub fn new() -> Self {
        Self
    }
}

impl DumpStrategy for LogDump {
    fn name(&self) -> &str {
        "log"
    }

    fn dump(&self, packet: &Packet, destination: &str) -> Result<(), ContractError> {
        info!(
            destination,
            pts = packet.pts,
            stream_index = packet.stream_index,
            size = packet.size(),
            "Packet dumped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dump_never_fails() {
        let strategy = LogDump::new();
        assert_eq!(strategy.name(), "log");
        assert!(strategy
            .dump(&Packet::new(1, 2, vec![0u8; 16]), "/nowhere/pkt.raw")
            .is_ok());
    }
}
