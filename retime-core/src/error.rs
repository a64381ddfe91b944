// ============================================================================
// retime-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types and Utilities
//
// This module defines the error taxonomy of the retime-core library. Probe
// errors surface before any run is possible, caller-input errors are fatal to
// a single call only, and engine failures carry the exit code so callers can
// tell a deliberate interruption apart from a real failure.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Exit code ffmpeg reports after it was interrupted by a signal.
pub const INTERRUPTED_EXIT_CODE: i32 = 255;

/// Custom error type for retime-core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Engine binary '{0}' not found")]
    EngineNotFound(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid speed multiplier {0}: must be a finite number greater than zero")]
    InvalidSpeed(f64),

    #[error("ffmpeg is not running")]
    NotRunning,

    #[error("A run is already active for this input")]
    AlreadyRunning,

    #[error("ffmpeg exited with code {code}: {detail}")]
    EngineExit { code: i32, detail: String },

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Failed to parse JSON output: {0}")]
    JsonParseError(String),

    #[error("Failed to promote output file: {0}")]
    Promotion(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// True when the engine stopped because it received an interrupt.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CoreError::EngineExit { code, .. } if *code == INTERRUPTED_EXIT_CODE)
    }

    /// Exit code of the engine, when this error comes from a finished process.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CoreError::EngineExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for retime-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds the error for a command that could not be spawned.
///
/// A missing binary becomes `EngineNotFound`, anything else `CommandStart`.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    let cmd = cmd.into();
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::EngineNotFound(cmd)
    } else {
        CoreError::CommandStart(cmd, err)
    }
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds an `EngineExit` error from a finished process status.
pub fn command_failed_error(status: ExitStatus, detail: impl Into<String>) -> CoreError {
    CoreError::EngineExit {
        code: exit_code_of(status),
        detail: detail.into(),
    }
}

/// Numeric exit code of a process, `128 + signal` when it was killed.
#[must_use]
pub fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_missing_binary_maps_to_engine_not_found() {
        let err = command_start_error(
            "ffmpeg",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(err, CoreError::EngineNotFound(ref bin) if bin == "ffmpeg"));

        let err = command_start_error(
            "ffmpeg",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, CoreError::CommandStart(..)));
    }

    #[test]
    fn test_interrupted_classification() {
        // wait status encoding: exit code lives in the high byte
        let interrupted = command_failed_error(ExitStatus::from_raw(255 << 8), "Exiting normally");
        assert!(interrupted.is_interrupted());
        assert_eq!(interrupted.exit_code(), Some(255));

        let failed = command_failed_error(ExitStatus::from_raw(1 << 8), "Conversion failed!");
        assert!(!failed.is_interrupted());
        assert_eq!(failed.exit_code(), Some(1));
        assert!(!CoreError::NotRunning.is_interrupted());
    }

    #[test]
    fn test_exit_code_of_signalled_process() {
        // raw status 9 = killed by SIGKILL
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code_of(ExitStatus::from_raw(0)), 0);
    }

    #[test]
    fn test_not_running_message() {
        assert_eq!(CoreError::NotRunning.to_string(), "ffmpeg is not running");
    }
}
