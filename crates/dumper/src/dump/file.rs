//! FileDump - writes each packet payload to the rendered path

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use contracts::{ContractError, DumpStrategy, Packet};
use tracing::{debug, instrument};

/// Strategy that treats the destination as a file path
///
/// The file is created (or truncated) and the payload written verbatim.
#[derive(Debug, Clone, Default)]
pub struct FileDump {
    create_dirs: bool,
}

impl FileDump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create missing parent directories before writing
    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    fn ensure_parent(&self, destination: &str) -> Result<(), ContractError> {
        let Some(parent) = Path::new(destination).parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }
        fs::create_dir_all(parent).map_err(|source| ContractError::DumpCreate {
            destination: destination.to_string(),
            source,
        })
    }
}

impl DumpStrategy for FileDump {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(
        name = "file_dump",
        skip(self, packet),
        fields(pts = packet.pts, size = packet.size())
    )]
    fn dump(&self, packet: &Packet, destination: &str) -> Result<(), ContractError> {
        if self.create_dirs {
            self.ensure_parent(destination)?;
        }
        dump_to_file(packet, destination)
    }
}

/// Write `packet`'s payload to the file at `destination`
///
/// # Errors
/// `ContractError::DumpCreate` if the file cannot be created,
/// `ContractError::DumpWrite` if the write fails.
pub fn dump_to_file(packet: &Packet, destination: &str) -> Result<(), ContractError> {
    let mut file = File::create(destination).map_err(|source| ContractError::DumpCreate {
        destination: destination.to_string(),
        source,
    })?;

    file.write_all(&packet.payload)
        .map_err(|source| ContractError::DumpWrite {
            destination: destination.to_string(),
            source,
        })?;

    debug!(destination, size = packet.size(), "packet dumped to file");
    Ok(())
}
