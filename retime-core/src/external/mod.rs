// ============================================================================
// retime-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg and ffprobe Binaries
//
// This module encapsulates everything that turns configuration into external
// command lines: the resolved command value handed to the supervisor, the
// ffmpeg argument builder, the ffprobe JSON executor and dependency checking.
//
// KEY COMPONENTS:
// - EngineCommand: immutable program + argument list
// - ffmpeg_builder: re-timing invocation and output format table
// - ffprobe_executor: machine-readable stream report
// - check_dependency: verifies a binary runs

use crate::error::{CoreResult, command_start_error};

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains ffmpeg argument building logic and the output format table
pub mod ffmpeg_builder;

/// Contains the ffprobe invocation and its JSON report structures
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::{EncoderParams, OutputFormat, VideoFilterChain, build};
pub use ffprobe_executor::{FfprobeFormat, FfprobeReport, FfprobeStream, run_ffprobe};

// ============================================================================
// ENGINE COMMAND
// ============================================================================

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Converts the invocation into a `std::process::Command` with no stdio set.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an engine binary exists and starts.
///
/// Runs `<binary> -version` with its output discarded. A binary that
/// cannot be found yields `EngineNotFound`; one that exists but cannot be
/// started yields `CommandStart`. The exit status itself is not inspected.
pub fn check_dependency(binary: &Path) -> CoreResult<()> {
    let name = binary.display().to_string();
    let result = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {name}");
            Ok(())
        }
        Err(e) => {
            let err = command_start_error(name, e);
            log::warn!("Dependency check failed: {err}");
            Err(err)
        }
    }
}
