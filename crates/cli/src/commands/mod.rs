//! Command implementations.

mod run;
mod validate;

pub use run::run_dumper;
pub use validate::run_validate;
