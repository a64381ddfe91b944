//! The per-input wrapper that starts the engine and interrupts it.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::pipes::set_nonblocking;
use super::run::Run;
use super::{RunState, Shared};
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::external::{OutputFormat, build};
use crate::media::{Metadata, probe};
use crate::temp_files::create_scratch_dir;

/// Supervisor for re-encoding one input video.
///
/// The input is probed once on construction. Runs are sequential: a second
/// `run` while one is active fails with `AlreadyRunning`. `stop` may be called
/// from any thread, typically through an `Arc<Transcoder>`.
///
/// ```rust,no_run
/// use retime_core::{EngineConfig, OutputFormat, Transcoder};
///
/// let transcoder = Transcoder::new("talk.webm", EngineConfig::default())?;
/// let mut run = transcoder.run("talk.2.mp4", 2.0, OutputFormat::Mp4)?;
/// for progress in &mut run {
///     println!("{:?}", progress?.time);
/// }
/// let summary = run.finish()?;
/// assert_eq!(summary.exit_code, 0);
/// # Ok::<(), retime_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct Transcoder {
    input: PathBuf,
    config: EngineConfig,
    metadata: Metadata,
    shared: Mutex<Shared>,
}

impl Transcoder {
    /// Probes `input` and returns a wrapper ready to run.
    pub fn new(input: impl Into<PathBuf>, config: EngineConfig) -> CoreResult<Self> {
        let input = input.into();
        config.validate()?;
        let metadata = probe(&input, &config)?;
        Ok(Self {
            input,
            config,
            metadata,
            shared: Mutex::new(Shared::default()),
        })
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.shared().state
    }

    /// Exit code of the last finished run; `None` before a run ends.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.state() {
            RunState::Done(code) => Some(code),
            _ => None,
        }
    }

    /// Starts re-encoding the input into `output` at `speed` times the
    /// original playback rate.
    ///
    /// The engine writes into a private scratch directory; the result is
    /// moved to `output` only when the engine exits successfully. Errors
    /// returned here leave the wrapper ready for another attempt.
    pub fn run(
        &self,
        output: impl Into<PathBuf>,
        speed: f64,
        format: OutputFormat,
    ) -> CoreResult<Run<'_>> {
        let destination = output.into();

        // Held until the child is registered so concurrent runs cannot race
        let mut shared = self.shared();
        if shared.state.is_active() {
            return Err(CoreError::AlreadyRunning);
        }
        shared.state = RunState::Idle;
        shared.signal_target = None;

        let scratch_dir = create_scratch_dir(&self.config, &destination)?;
        let file_name = destination
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("output.{}", format.extension())));
        let scratch_file = scratch_dir.path().join(file_name);

        let command = build(&self.input, &scratch_file, speed, format, &self.config)?;
        log::debug!("Running: {command}");

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error(self.config.ffmpeg_name(), e))?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                discard(&mut child);
                return Err(CoreError::Io(io::Error::other("engine pipes unavailable")));
            }
        };
        if let Err(e) = set_nonblocking(&stderr).and_then(|()| set_nonblocking(&stdout)) {
            discard(&mut child);
            return Err(e.into());
        }

        let pid = child.id();
        shared.state = RunState::Running { pid };
        shared.signal_target = Some(pid);
        drop(shared);

        log::info!(
            "Started ffmpeg (pid {pid}): {} -> {} at {speed}x",
            self.input.display(),
            destination.display()
        );
        Ok(Run::new(
            self,
            child,
            stdout,
            stderr,
            scratch_dir,
            scratch_file,
            destination,
        ))
    }

    /// Asks the running engine to stop by sending it `SIGINT`.
    ///
    /// Does not wait for the engine to exit; the `Run` observes the exit.
    /// Fails with `NotRunning` when no engine is active.
    pub fn stop(&self) -> CoreResult<()> {
        let mut shared = self.shared();
        let pid = match shared.state {
            RunState::Running { pid } | RunState::Stopping { pid } => pid,
            RunState::Idle | RunState::Done(_) => return Err(CoreError::NotRunning),
        };

        if let Some(target) = shared.signal_target {
            let raw = i32::try_from(target)
                .map_err(|_| CoreError::Io(io::Error::other(format!("invalid pid {target}"))))?;
            match kill(Pid::from_raw(raw), Signal::SIGINT) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => {
                    log::warn!("Failed to interrupt ffmpeg (pid {target}): {e}");
                    return Err(CoreError::Io(e.into()));
                }
            }
            log::info!("Sent SIGINT to ffmpeg (pid {target})");
        }
        shared.state = RunState::Stopping { pid };
        Ok(())
    }

    pub(crate) fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Kills and reaps a child that never became a run.
fn discard(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill ffmpeg (pid {}): {e}", child.id());
    }
    let _ = child.wait();
}
