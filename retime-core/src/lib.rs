//! Core library for re-encoding videos at an altered playback speed using
//! ffmpeg and ffprobe.
//!
//! This crate probes input videos, builds the re-timing ffmpeg invocation,
//! supervises the engine process while reporting its progress, supports
//! interrupting it from another thread and promotes the finished output to
//! its destination atomically.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use retime_core::{EngineConfigBuilder, OutputFormat, Transcoder};
//! use std::sync::Arc;
//!
//! let config = EngineConfigBuilder::new().build();
//! let transcoder = Arc::new(Transcoder::new("lecture.webm", config).unwrap());
//! println!("{}", transcoder.metadata());
//!
//! let stopper = Arc::clone(&transcoder);
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(60));
//!     let _ = stopper.stop();
//! });
//!
//! let total = transcoder.metadata().output_duration(1.5);
//! let mut run = transcoder.run("lecture.1.5.mp4", 1.5, OutputFormat::Mp4).unwrap();
//! for progress in &mut run {
//!     let progress = progress.unwrap();
//!     println!("{:.1}% at {} fps", progress.percent_of(total), progress.fps);
//! }
//! match run.finish() {
//!     Ok(summary) => println!("wrote {}", summary.output.display()),
//!     Err(e) if e.is_interrupted() => println!("stopped"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#[cfg(not(unix))]
compile_error!("retime-core supervises processes with POSIX facilities and requires a Unix target");

pub mod config;
pub mod error;
pub mod external;
pub mod media;
pub mod progress;
pub mod supervisor;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{EngineConfig, EngineConfigBuilder, ProbeStrategy};
pub use error::{CoreError, CoreResult, INTERRUPTED_EXIT_CODE};
pub use external::{EngineCommand, OutputFormat, check_dependency};
pub use media::{Metadata, Resolution, StreamDetails, probe};
pub use progress::Progress;
pub use supervisor::{Run, RunState, RunSummary, Transcoder};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
