//! Temporary file management utilities.
//!
//! Scratch directories hold the engine's output while it is being written.
//! They rely on the tempfile crate for cleanup via the Drop trait, so an
//! abandoned or failed run never leaves partial files behind. A finished
//! output is promoted to its destination in a single atomic step.

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Prefix of every scratch directory.
pub const SCRATCH_PREFIX: &str = ".retime-";

/// Directory a path lives in; `.` for a bare file name.
#[must_use]
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Creates a private scratch directory for a run writing to `destination`.
///
/// The base is `config.temp_dir` when set (created if needed), else the
/// destination's own directory so that promotion stays on one file system.
/// The destination's directory must already exist. Auto-cleaned when dropped.
pub fn create_scratch_dir(config: &EngineConfig, destination: &Path) -> CoreResult<TempDir> {
    let base = match &config.temp_dir {
        Some(temp_dir) => {
            fs::create_dir_all(temp_dir)?;
            temp_dir.clone()
        }
        None => parent_dir(destination),
    };
    let output_dir = parent_dir(destination);
    if !output_dir.is_dir() {
        return Err(CoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("output directory {} does not exist", output_dir.display()),
        )));
    }

    let dir = TempFileBuilder::new().prefix(SCRATCH_PREFIX).tempdir_in(&base)?;
    log::debug!("Created scratch directory {}", dir.path().display());
    Ok(dir)
}

/// Moves a finished output from `scratch` to `destination`.
///
/// A plain rename is used when both are on the same file system. Across file
/// systems the content is copied into a temporary file beside the
/// destination which is then renamed into place, so a failed copy never
/// leaves a partial destination.
pub fn promote(scratch: &Path, destination: &Path) -> CoreResult<()> {
    match fs::rename(scratch, destination) {
        Ok(()) => {
            log::debug!(
                "Renamed {} to {}",
                scratch.display(),
                destination.display()
            );
            Ok(())
        }
        Err(e) if is_cross_device(&e) => {
            log::debug!(
                "{} is on another file system, copying",
                destination.display()
            );
            copy_then_persist(scratch, destination)
        }
        Err(e) => Err(CoreError::Promotion(format!(
            "cannot move {} to {}: {e}",
            scratch.display(),
            destination.display()
        ))),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32)
}

fn copy_then_persist(scratch: &Path, destination: &Path) -> CoreResult<()> {
    let promotion_error =
        |e: io::Error| CoreError::Promotion(format!("cannot copy to {}: {e}", destination.display()));

    let mut staged = TempFileBuilder::new()
        .prefix(SCRATCH_PREFIX)
        .tempfile_in(parent_dir(destination))
        .map_err(promotion_error)?;
    let mut source = File::open(scratch).map_err(promotion_error)?;
    io::copy(&mut source, staged.as_file_mut()).map_err(promotion_error)?;
    staged.as_file().sync_all().map_err(promotion_error)?;

    staged
        .persist(destination)
        .map_err(|e| promotion_error(e.error))?;
    fs::remove_file(scratch)?;
    Ok(())
}
