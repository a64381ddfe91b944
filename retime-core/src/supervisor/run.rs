//! The progress iterator of one engine run.

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout};
use tempfile::TempDir;

use super::RunState;
use super::pipes::{LineBuffer, read_available};
use super::transcoder::Transcoder;
use crate::error::{
    CoreError, CoreResult, INTERRUPTED_EXIT_CODE, command_wait_error, exit_code_of,
};
use crate::progress::{self, Progress};
use crate::temp_files::promote;

/// Log target for the engine's raw diagnostic output.
pub const ENGINE_LOG_TARGET: &str = "retime::engine";

/// Longest wait in poll(2) before checking whether the engine has exited.
const EXIT_CHECK_INTERVAL_MS: u16 = 100;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub exit_code: i32,
    /// Destination the output was promoted to
    pub output: PathBuf,
    /// Number of progress records yielded
    pub events: usize,
}

/// A running engine, consumed as a sequence of progress records.
///
/// Each call to `next` blocks until the engine reports progress or exits.
/// The sequence ends once the process has exited and its output streams have
/// been drained; a successful output has been promoted by then. A descendant
/// still holding the streams open does not delay the end. Dropping the
/// run early kills the engine and removes its scratch output.
pub struct Run<'a> {
    transcoder: &'a Transcoder,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    lines: LineBuffer,
    last_line: Option<String>,
    scratch_dir: Option<TempDir>,
    scratch_file: PathBuf,
    destination: PathBuf,
    exit_code: Option<i32>,
    events: usize,
    exited: bool,
    finished: bool,
}

impl<'a> Run<'a> {
    pub(crate) fn new(
        transcoder: &'a Transcoder,
        child: Child,
        stdout: ChildStdout,
        stderr: ChildStderr,
        scratch_dir: TempDir,
        scratch_file: PathBuf,
        destination: PathBuf,
    ) -> Self {
        Self {
            transcoder,
            child: Some(child),
            stdout: Some(stdout),
            stderr: Some(stderr),
            lines: LineBuffer::new(),
            last_line: None,
            scratch_dir: Some(scratch_dir),
            scratch_file,
            destination,
            exit_code: None,
            events: 0,
            exited: false,
            finished: false,
        }
    }

    /// Process id of the engine, while it has not been reaped.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Exit code of the engine once the sequence has ended.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Drains the remaining progress and reports how the engine exited.
    ///
    /// A non-zero exit becomes `EngineExit` with the engine's last diagnostic
    /// line; `CoreError::is_interrupted` tells a stopped run apart.
    pub fn finish(mut self) -> CoreResult<RunSummary> {
        for item in self.by_ref() {
            item?;
        }

        match self.exit_code {
            Some(0) => Ok(RunSummary {
                exit_code: 0,
                output: self.destination.clone(),
                events: self.events,
            }),
            code => Err(CoreError::EngineExit {
                code: code.unwrap_or(-1),
                detail: self.last_line.clone().unwrap_or_default(),
            }),
        }
    }

    fn poll_pipes(&mut self) -> CoreResult<Option<Progress>> {
        let (stdout_ready, stderr_ready) = {
            let mut fds = Vec::with_capacity(2);
            if let Some(stdout) = &self.stdout {
                fds.push(PollFd::new(stdout.as_fd(), PollFlags::POLLIN));
            }
            if let Some(stderr) = &self.stderr {
                fds.push(PollFd::new(stderr.as_fd(), PollFlags::POLLIN));
            }

            match poll(&mut fds, PollTimeout::from(EXIT_CHECK_INTERVAL_MS)) {
                Ok(_) => {}
                Err(Errno::EINTR) => return Ok(None),
                Err(e) => return Err(CoreError::Io(e.into())),
            }

            let ready = |fd: &PollFd<'_>| {
                fd.revents().is_some_and(|r| {
                    r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
                })
            };
            let mut fds = fds.iter();
            let stdout_ready = self.stdout.is_some() && fds.next().is_some_and(ready);
            let stderr_ready = self.stderr.is_some() && fds.next().is_some_and(ready);
            (stdout_ready, stderr_ready)
        };

        if stdout_ready {
            self.drain_stdout()?;
        }
        if stderr_ready {
            return self.read_stderr(false);
        }
        Ok(None)
    }

    /// One wake of the loop: progress if a batch produced some.
    fn step(&mut self) -> CoreResult<Option<Progress>> {
        if let Some(progress) = self.poll_pipes()? {
            return Ok(Some(progress));
        }
        if self.check_exited()? {
            return self.drain_after_exit();
        }
        Ok(None)
    }

    /// Notes whether the engine has exited, without blocking.
    ///
    /// The signal target is cleared under the same lock that reaps the
    /// child, so `stop` never signals a pid that may have been recycled.
    fn check_exited(&mut self) -> CoreResult<bool> {
        if self.exited {
            return Ok(true);
        }
        let Some(child) = self.child.as_mut() else {
            return Ok(true);
        };

        let mut shared = self.transcoder.shared();
        match child.try_wait() {
            Ok(Some(status)) => {
                shared.signal_target = None;
                log::debug!("ffmpeg (pid {}) exited with {status}", child.id());
                self.exited = true;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(command_wait_error(self.transcoder.config().ffmpeg_name(), e)),
        }
    }

    /// Reads what the exited engine left in its pipes, then closes them.
    fn drain_after_exit(&mut self) -> CoreResult<Option<Progress>> {
        self.drain_stdout()?;
        self.stdout = None;
        self.read_stderr(true)
    }

    fn drain_stdout(&mut self) -> CoreResult<()> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(());
        };
        let mut discarded = Vec::new();
        if read_available(stdout, &mut discarded)? {
            log::debug!("ffmpeg closed stdout");
            self.stdout = None;
        }
        Ok(())
    }

    fn read_stderr(&mut self, force_close: bool) -> CoreResult<Option<Progress>> {
        let Some(stderr) = self.stderr.as_mut() else {
            return Ok(None);
        };
        let mut data = Vec::new();
        let closed = read_available(stderr, &mut data)? || force_close;

        let mut batch = self.lines.push(&data);
        if closed {
            log::debug!("Done reading ffmpeg stderr");
            self.stderr = None;
            batch.extend(self.lines.finish());
        }

        for line in &batch {
            log::trace!(target: ENGINE_LOG_TARGET, "{line}");
        }
        if let Some(last) = batch.last() {
            self.last_line = Some(last.trim().to_string());
        }
        Ok(progress::parse(&batch))
    }

    /// Reaps the exited engine and promotes or discards its output.
    fn complete(&mut self) -> CoreResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        self.transcoder.shared().signal_target = None;

        // Returns the recorded status when `check_exited` already reaped it
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                self.set_done(-1);
                return Err(command_wait_error(self.transcoder.config().ffmpeg_name(), e));
            }
        };
        let code = exit_code_of(status);
        self.exit_code = Some(code);

        let result = if code == 0 {
            log::info!("ffmpeg finished, promoting {}", self.destination.display());
            promote(&self.scratch_file, &self.destination)
        } else {
            let detail = self.last_line.as_deref().unwrap_or_default();
            if code == INTERRUPTED_EXIT_CODE {
                log::info!("ffmpeg was interrupted: {detail}");
            } else {
                log::error!("ffmpeg exited with code {code}: {detail}");
            }
            Ok(())
        };

        self.remove_scratch();
        self.set_done(code);
        result
    }

    /// Kills and reaps an engine that is still running.
    fn abort(&mut self) {
        self.stdout = None;
        self.stderr = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        self.transcoder.shared().signal_target = None;

        log::warn!("Killing ffmpeg (pid {})", child.id());
        if let Err(e) = child.kill() {
            log::warn!("Failed to kill ffmpeg (pid {}): {e}", child.id());
        }
        let code = match child.wait() {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                log::warn!("Failed to reap ffmpeg: {e}");
                -1
            }
        };
        self.exit_code = Some(code);
        self.remove_scratch();
        self.set_done(code);
    }

    fn remove_scratch(&mut self) {
        if let Some(dir) = self.scratch_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove scratch directory {}: {e}", path.display());
            }
        }
    }

    fn set_done(&self, code: i32) {
        self.transcoder.shared().state = RunState::Done(code);
    }
}

impl Iterator for Run<'_> {
    type Item = CoreResult<Progress>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.stdout.is_none() && self.stderr.is_none() {
                self.finished = true;
                return self.complete().err().map(Err);
            }

            match self.step() {
                Ok(Some(progress)) => {
                    self.events += 1;
                    return Some(Ok(progress));
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("Supervising ffmpeg failed: {e}");
                    self.finished = true;
                    self.abort();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
        self.remove_scratch();
    }
}

impl std::fmt::Debug for Run<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("pid", &self.pid())
            .field("destination", &self.destination)
            .field("exit_code", &self.exit_code)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
