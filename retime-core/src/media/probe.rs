//! Metadata probing for input videos
//!
//! Two strategies exist. The default asks ffprobe for a JSON stream report.
//! The decode pass runs ffmpeg over the whole first video stream into a null
//! sink and reads the frame count and duration off its final status line;
//! slower, but exact for inputs whose container duration is missing or wrong.

use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use super::info::{Metadata, Resolution, StreamDetails};
use crate::config::{EngineConfig, ProbeStrategy};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::external::{EngineCommand, FfprobeReport, run_ffprobe};
use crate::progress::key_values;
use crate::utils::{last_diagnostic_line, parse_ffmpeg_time};

/// A video stream description line, e.g.
/// `Stream #0:0(eng): Video: h264 (High), yuv420p(tv, bt709), 1920x1080 [SAR 1:1], ...`
static VIDEO_STREAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #\d+:\d+\S*: Video: .*?, (\d+)x(\d+)").expect("valid stream regex")
});

/// Probes `input` with the strategy selected in `config`.
pub fn probe(input: &Path, config: &EngineConfig) -> CoreResult<Metadata> {
    if !input.exists() {
        return Err(CoreError::InputNotFound(input.display().to_string()));
    }

    log::debug!(
        "Probing {} with the {} strategy",
        input.display(),
        config.probe_strategy
    );
    let metadata = match config.probe_strategy {
        ProbeStrategy::Ffprobe => metadata_from_report(input, &run_ffprobe(input, config)?)?,
        ProbeStrategy::Decode => decode_probe(input, config)?,
    };
    log::info!("{}: {metadata}", input.display());
    Ok(metadata)
}

/// Interprets an ffprobe report, selecting the first video stream.
pub fn metadata_from_report(input: &Path, report: &FfprobeReport) -> CoreResult<Metadata> {
    let mut video_streams = report.video_streams();
    let stream = video_streams.next().ok_or_else(|| {
        CoreError::InvalidVideo(format!("No video streams found in {}", input.display()))
    })?;
    if video_streams.next().is_some() {
        log::warn!(
            "More than one video stream in {}, using the first one",
            input.display()
        );
    }

    let codec = stream
        .codec_name
        .clone()
        .ok_or_else(|| CoreError::InvalidVideo("video stream has no codec".to_string()))?;
    let pixel_format = stream
        .pix_fmt
        .clone()
        .ok_or_else(|| CoreError::InvalidVideo("video stream has no pixel format".to_string()))?;

    let format = report.format.as_ref();
    if let Some(name) = format.and_then(|f| f.format_name.as_deref()) {
        log::debug!("{} container: {name}", input.display());
    }
    // ffprobe writes "N/A" for unknown durations; try the stream's then
    let duration = format
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds)
        .or_else(|| stream.duration.as_deref().and_then(parse_seconds))
        .ok_or_else(|| {
            CoreError::InvalidVideo(format!("No duration reported for {}", input.display()))
        })?;

    let resolution = match (stream.width, stream.height) {
        (Some(width), Some(height)) => Resolution::new(width, height),
        _ => None,
    };

    Ok(Metadata {
        duration,
        resolution,
        details: StreamDetails::Codec {
            codec,
            pixel_format,
        },
    })
}

fn decode_probe(input: &Path, config: &EngineConfig) -> CoreResult<Metadata> {
    let command = EngineCommand::new(&config.ffmpeg_path)
        .args(["-hide_banner", "-nostdin", "-i"])
        .arg(input)
        .args(["-map", "0:v:0", "-f", "null", "-"]);
    log::debug!("Running: {command}");

    let output = command
        .to_command()
        .stdin(Stdio::null())
        .output()
        .map_err(|e| command_start_error(config.ffmpeg_name(), e))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        let detail = last_diagnostic_line(&text)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} exited with {}", config.ffmpeg_name(), output.status));
        log::error!("Decode pass failed on {}: {detail}", input.display());
        return Err(CoreError::InvalidVideo(detail));
    }

    parse_decode_output(&text)
}

/// Extracts metadata from the combined output of a null-sink decode pass.
///
/// The last status line carries `frame` and `time`; the first video stream
/// line carries the resolution.
pub fn parse_decode_output(text: &str) -> CoreResult<Metadata> {
    let lines: Vec<&str> = text.split(['\r', '\n']).collect();

    // Only the input section describes the source streams
    let video_lines: Vec<&str> = lines
        .iter()
        .copied()
        .take_while(|line| !line.starts_with("Output #"))
        .filter(|line| line.contains("Stream #") && line.contains(": Video: "))
        .collect();
    let Some(first_video) = video_lines.first() else {
        return Err(CoreError::InvalidVideo("No video streams found".to_string()));
    };
    if video_lines.len() > 1 {
        log::warn!("More than one video stream in decode output, using the first one");
    }

    let resolution = VIDEO_STREAM_RE.captures(first_video).and_then(|caps| {
        let width = caps.get(1)?.as_str().parse().ok()?;
        let height = caps.get(2)?.as_str().parse().ok()?;
        Resolution::new(width, height)
    });

    let (frame_count, duration) = lines
        .iter()
        .rev()
        .find_map(|line| {
            let pairs = key_values(line);
            let value = |key: &str| pairs.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v);
            let frame_count = value("frame")?.parse::<u64>().ok()?;
            let duration = parse_ffmpeg_time(value("time")?)?;
            Some((frame_count, duration))
        })
        .ok_or_else(|| CoreError::InvalidVideo("No frame statistics in decode output".to_string()))?;

    Ok(Metadata {
        duration,
        resolution,
        details: StreamDetails::Frames { frame_count },
    })
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}
