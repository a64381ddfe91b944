//! FFprobe integration for stream analysis
//!
//! Runs ffprobe with JSON output and deserialises the parts of the report
//! the prober needs. Every field is optional: ffprobe omits keys freely
//! depending on container and codec.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;

use super::EngineCommand;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::utils::last_diagnostic_line;

/// Root of `ffprobe -show_format -show_streams` JSON output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeReport {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: Option<FfprobeFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeStream {
    pub index: Option<u32>,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub pix_fmt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Stream duration in seconds, as a decimal string
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeFormat {
    pub format_name: Option<String>,
    /// Container duration in seconds, as a decimal string
    pub duration: Option<String>,
}

impl FfprobeReport {
    /// Streams whose `codec_type` is `video`, in index order.
    pub fn video_streams(&self) -> impl Iterator<Item = &FfprobeStream> {
        self.streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some("video"))
    }
}

/// Builds the ffprobe invocation for `input`.
pub fn ffprobe_command(input: &Path, config: &EngineConfig) -> EngineCommand {
    EngineCommand::new(&config.ffprobe_path)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input)
}

/// Runs ffprobe on `input` and parses its report.
///
/// A non-zero exit means ffprobe could not read the input and yields
/// `InvalidVideo` carrying ffprobe's last diagnostic line.
pub fn run_ffprobe(input: &Path, config: &EngineConfig) -> CoreResult<FfprobeReport> {
    let command = ffprobe_command(input, config);
    log::debug!("Running: {command}");

    let output = command
        .to_command()
        .stdin(Stdio::null())
        .output()
        .map_err(|e| command_start_error(config.ffprobe_name(), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = last_diagnostic_line(&stderr)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} exited with {}", config.ffprobe_name(), output.status));
        log::error!("ffprobe failed on {}: {detail}", input.display());
        return Err(CoreError::InvalidVideo(detail));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        CoreError::JsonParseError(format!(
            "Failed to parse ffprobe JSON output for {}: {}",
            input.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfigBuilder;

    #[test]
    fn test_report_tolerates_missing_fields() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "codec_name": "opus"},
                {"index": 1, "codec_type": "video", "codec_name": "vp9", "pix_fmt": "yuv420p",
                 "width": 320, "height": 240, "r_frame_rate": "25/1"}
            ],
            "format": {"filename": "in.webm", "duration": "49.713000"}
        }"#;
        let report: FfprobeReport = serde_json::from_str(json).unwrap();
        let video: Vec<_> = report.video_streams().collect();
        assert_eq!(video.len(), 1);
        assert_eq!(video[0].index, Some(1));
        assert_eq!(video[0].width, Some(320));
        assert_eq!(report.format.unwrap().duration.as_deref(), Some("49.713000"));

        let empty: FfprobeReport = serde_json::from_str("{}").unwrap();
        assert!(empty.streams.is_empty());
        assert!(empty.format.is_none());
    }

    #[test]
    fn test_ffprobe_command_arguments() {
        let config = EngineConfigBuilder::new().ffprobe_path("/usr/bin/ffprobe").build();
        let cmd = ffprobe_command(Path::new("in.webm"), &config);
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/ffprobe -v error -print_format json -show_format -show_streams in.webm"
        );
    }
}
