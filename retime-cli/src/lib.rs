// retime-cli/src/lib.rs
//
// Library portion of the Retime CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ProbeArgs, RunArgs};
pub use commands::probe::run_probe;
pub use commands::run::{RunOutcome, run_retime};
