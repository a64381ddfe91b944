//! Configuration structures and constants for the retime-core library.
//!
//! This module controls where the engine binaries live, which probing
//! strategy is used and where scratch output is written during a run.
//! Defaults are read from `RETIME_*` environment variables.

mod builder;
mod utils;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use utils::{get_env_optional_path, get_env_path, get_env_string};

pub use builder::EngineConfigBuilder;

/// Environment variable overriding the ffmpeg binary.
pub const ENV_FFMPEG: &str = "RETIME_FFMPEG";

/// Environment variable overriding the ffprobe binary.
pub const ENV_FFPROBE: &str = "RETIME_FFPROBE";

/// Environment variable selecting the scratch base directory.
pub const ENV_TEMP_DIR: &str = "RETIME_TEMP_DIR";

/// Environment variable selecting the probing strategy (`ffprobe` or `decode`).
pub const ENV_PROBE_STRATEGY: &str = "RETIME_PROBE_STRATEGY";

/// Default ffmpeg binary, resolved through `PATH`.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Default ffprobe binary, resolved through `PATH`.
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// How metadata is extracted from the input video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy {
    /// Machine-readable ffprobe JSON: codec, pixel format, duration, resolution.
    #[default]
    Ffprobe,
    /// Full ffmpeg decode to a null sink: frame count, duration, resolution.
    Decode,
}

impl FromStr for ProbeStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffprobe" => Ok(ProbeStrategy::Ffprobe),
            "decode" | "decode-pass" => Ok(ProbeStrategy::Decode),
            other => Err(CoreError::Config(format!("unknown probe strategy '{other}'"))),
        }
    }
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStrategy::Ffprobe => f.write_str("ffprobe"),
            ProbeStrategy::Decode => f.write_str("decode"),
        }
    }
}

/// Engine configuration shared by probing and running.
///
/// `Default` reads the `RETIME_*` environment variables; the builder
/// overrides individual fields on top of those defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg binary used for transcoding and the decode-pass probe
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary used by the default probe strategy
    pub ffprobe_path: PathBuf,

    /// Base directory for scratch output. When unset, scratch directories
    /// are created beside the destination so promotion is a plain rename.
    pub temp_dir: Option<PathBuf>,

    /// Metadata extraction strategy
    pub probe_strategy: ProbeStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let probe_strategy = get_env_string(ENV_PROBE_STRATEGY, String::new());
        let probe_strategy = if probe_strategy.trim().is_empty() {
            ProbeStrategy::default()
        } else {
            probe_strategy.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring {ENV_PROBE_STRATEGY}: {e}");
                ProbeStrategy::default()
            })
        };

        Self {
            ffmpeg_path: get_env_path(ENV_FFMPEG, PathBuf::from(DEFAULT_FFMPEG)),
            ffprobe_path: get_env_path(ENV_FFPROBE, PathBuf::from(DEFAULT_FFPROBE)),
            temp_dir: get_env_optional_path(ENV_TEMP_DIR),
            probe_strategy,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffmpeg path is empty".to_string()));
        }
        if self.ffprobe_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffprobe path is empty".to_string()));
        }
        if let Some(dir) = &self.temp_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(CoreError::Config(format!(
                    "temp directory {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Display name of the ffmpeg binary, used in errors and logs.
    #[must_use]
    pub fn ffmpeg_name(&self) -> String {
        self.ffmpeg_path.display().to_string()
    }

    /// Display name of the ffprobe binary, used in errors and logs.
    #[must_use]
    pub fn ffprobe_name(&self) -> String {
        self.ffprobe_path.display().to_string()
    }
}
