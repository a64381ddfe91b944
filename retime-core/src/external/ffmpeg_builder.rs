//! FFmpeg command builder utilities
//!
//! This module builds the re-timing ffmpeg invocation: the output format
//! table, the video filter chain and the final argument list. Everything
//! here is pure computation; nothing touches the file system.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::EngineCommand;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};

/// Encoder settings for one output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    /// Container passed to `-f`
    pub container: &'static str,
    /// Video encoder passed to `-c:v`
    pub codec: &'static str,
    pub preset: &'static str,
    pub crf: u8,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// H.264 in an MP4 container
    #[default]
    Mp4,
}

impl OutputFormat {
    /// All formats, in display order.
    pub const ALL: [OutputFormat; 1] = [OutputFormat::Mp4];

    #[must_use]
    pub fn params(self) -> EncoderParams {
        match self {
            OutputFormat::Mp4 => EncoderParams {
                container: "mp4",
                codec: "libx264",
                preset: "slower",
                crf: 17,
            },
        }
    }

    /// File extension used for default output names.
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.params().container
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(key))
            .ok_or_else(|| CoreError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Mp4 => f.write_str("mp4"),
        }
    }
}

/// Builder for constructing video filter chains
#[derive(Debug, Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-times presentation timestamps so playback runs `speed` times faster.
    #[must_use]
    pub fn add_speed(self, speed: f64) -> Self {
        let factor = 1.0 / speed;
        self.add_filter(format!("setpts={factor}*PTS"))
    }

    /// Adds a filter to the chain; empty filters are skipped
    #[must_use]
    fn add_filter(mut self, filter: String) -> Self {
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Checks that `speed` is a usable multiplier.
pub fn validate_speed(speed: f64) -> CoreResult<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidSpeed(speed))
    }
}

/// Builds the ffmpeg invocation re-encoding `input` into `output` at `speed`.
///
/// Only the first video stream is mapped and audio is dropped. `-y` lets the
/// engine overwrite `output`, which is always a scratch path owned by the
/// supervisor.
pub fn build(
    input: &Path,
    output: &Path,
    speed: f64,
    format: OutputFormat,
    config: &EngineConfig,
) -> CoreResult<EngineCommand> {
    validate_speed(speed)?;
    let params = format.params();

    let mut cmd = EngineCommand::new(&config.ffmpeg_path)
        .args(["-hide_banner", "-nostdin", "-y"])
        .arg("-i")
        .arg(input)
        .args(["-map", "0:v:0"]);

    if let Some(filter) = VideoFilterChain::new().add_speed(speed).build() {
        cmd = cmd.arg("-filter:v").arg(filter);
    }

    let cmd = cmd
        .arg("-an")
        .args(["-c:v", params.codec])
        .args(["-preset", params.preset])
        .arg("-crf")
        .arg(params.crf.to_string())
        .args(["-f", params.container])
        .arg(output);

    log::debug!("Built ffmpeg command: {cmd}");
    Ok(cmd)
}
