// ============================================================================
// retime-core/src/supervisor/mod.rs
// ============================================================================
//
// PROCESS SUPERVISION: Running, Observing and Interrupting ffmpeg
//
// A `Transcoder` wraps one input video. Each call to `Transcoder::run`
// launches the engine and returns a `Run`, an iterator that multiplexes the
// engine's stdout and stderr with poll(2) and yields progress snapshots until
// the process exits. `Transcoder::stop` interrupts the engine from any thread.
//
// KEY COMPONENTS:
// - RunState: lifecycle of the current run
// - Transcoder: probing, launching and signalling
// - Run: the blocking progress iterator, promotion and cleanup
// - pipes: non-blocking reads and line reassembly

pub mod pipes;
pub mod run;
pub mod transcoder;

pub use run::{Run, RunSummary};
pub use transcoder::Transcoder;

use std::fmt;

/// Lifecycle of the most recent run of a `Transcoder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No engine launched yet
    #[default]
    Idle,
    /// Engine process started
    Running { pid: u32 },
    /// Interrupt sent, waiting for the engine to exit
    Stopping { pid: u32 },
    /// Engine reaped with this exit code
    Done(i32),
}

impl RunState {
    /// True while an engine process belongs to this state.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running { .. } | RunState::Stopping { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running { pid } => write!(f, "running (pid {pid})"),
            RunState::Stopping { pid } => write!(f, "stopping (pid {pid})"),
            RunState::Done(code) => write!(f, "done (exit code {code})"),
        }
    }
}

/// State shared between a `Run` and `Transcoder::stop`.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) state: RunState,
    /// Process that may still be signalled. Cleared before the child is
    /// reaped, after which its pid can be reused by the system.
    pub(crate) signal_target: Option<u32>,
}
