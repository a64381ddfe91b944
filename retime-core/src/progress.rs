//! ffmpeg progress line parsing
//!
//! ffmpeg reports its status on stderr as space-separated `key=value`
//! tokens, e.g.
//!
//! ```text
//! frame= 1234 fps=29.7 q=28.0 size=    1024kB time=00:00:41.23 bitrate= 512.3kbits/s speed=1.98x
//! ```
//!
//! [`parse`] turns a batch of such lines into a typed [`Progress`] record.
//! Only the most recent parsable line of a batch is reported.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;

use crate::utils::{parse_ffmpeg_time, parse_size_bytes, serialize_secs};

/// Matches one `key=value` token; values may be padded after the `=`.
static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=\s*([^ ]+) ?").expect("valid progress regex"));

/// One progress snapshot of a running encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Frames encoded so far, when reported
    pub frame: Option<u64>,
    /// Current encoding rate in frames per second
    pub fps: f64,
    /// Output size with ffmpeg's unit suffix, e.g. "1024kB"
    pub size: String,
    /// Output timestamp reached so far
    #[serde(serialize_with = "serialize_secs")]
    pub time: Duration,
    /// Current bitrate, e.g. "512.3kbits/s"
    pub bitrate: String,
    /// Encoding speed relative to real time; ffmpeg omits it at times
    pub speed: Option<f64>,
}

impl Progress {
    /// Numeric magnitude of `size` in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        parse_size_bytes(&self.size)
    }

    /// Share of `total` covered by `time`, in percent, clamped to 0..=100.
    #[must_use]
    pub fn percent_of(&self, total: Duration) -> f64 {
        if total.is_zero() {
            return 0.0;
        }
        (self.time.as_secs_f64() / total.as_secs_f64() * 100.0).clamp(0.0, 100.0)
    }

    /// Builds a record from raw pairs; `None` if a field is missing or invalid.
    fn from_pairs(pairs: &[(&str, &str)]) -> Option<Self> {
        let get = |key: &str| pairs.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v);

        let fps = get("fps")?.parse::<f64>().ok().filter(|fps| *fps >= 0.0)?;
        let time = parse_ffmpeg_time(get("time")?)?;
        let size = get("size")?.to_string();
        let bitrate = get("bitrate")?.to_string();
        let speed = match get("speed") {
            None | Some("N/A") => None,
            Some(raw) => Some(parse_speed(raw)?),
        };
        let frame = match get("frame") {
            None => None,
            Some(raw) => Some(raw.parse::<u64>().ok()?),
        };

        Some(Self {
            frame,
            fps,
            size,
            time,
            bitrate,
            speed,
        })
    }
}

/// Splits one line into its `key=value` pairs, in order of appearance.
#[must_use]
pub fn key_values(line: &str) -> Vec<(&str, &str)> {
    PROGRESS_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            Some((key, value))
        })
        .collect()
}

/// Finds the most recent progress record in a batch of log lines.
///
/// Lines are scanned newest first. A line with pairs that do not form a
/// complete record (a wrapped fragment, `time=N/A` while the muxer starts)
/// is skipped and the scan continues with the previous line.
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Option<Progress> {
    for line in lines.iter().rev() {
        let line = line.as_ref();
        let pairs = key_values(line);
        if pairs.is_empty() {
            continue;
        }
        log::debug!("progress pairs: {pairs:?}");

        match Progress::from_pairs(&pairs) {
            Some(progress) => return Some(progress),
            None => log::debug!("Invalid progress line {line:?}"),
        }
    }
    None
}

/// Parses a speed in `N.NNx` format.
fn parse_speed(raw: &str) -> Option<f64> {
    raw.trim_end_matches('x').parse().ok()
}
