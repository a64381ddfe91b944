//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `probe` command.
/// Prints the metadata retime computes for an input video.
pub mod probe;

/// Module containing the implementation of the `run` command.
/// Re-encodes a video at an altered speed with progress and cancellation.
pub mod run;
