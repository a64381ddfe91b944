//! Media information and probing module
//!
//! This module obtains metadata about an input video, either from ffprobe's
//! JSON report or from a full ffmpeg decode pass, and defines the data
//! structures representing it.

pub mod info;
pub mod probe;

// Re-export commonly used types
pub use info::{Metadata, Resolution, StreamDetails};
pub use probe::probe;
