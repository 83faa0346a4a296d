//! Dump strategy implementations
//!
//! Contains FileDump (the default) and LogDump.

mod file;
mod log;

use std::sync::Arc;

use contracts::{DumpConfig, DumpKind, SharedDumpStrategy};

pub use self::file::{dump_to_file, FileDump};
pub use self::log::LogDump;

/// Build the strategy described by `config`
pub fn from_config(config: &DumpConfig) -> SharedDumpStrategy {
    match config.strategy {
        DumpKind::File => Arc::new(FileDump::new().with_create_dirs(config.create_dirs)),
        DumpKind::Log => Arc::new(LogDump::new()),
    }
}
