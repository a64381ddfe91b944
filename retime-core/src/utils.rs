//! Utility functions for formatting and parsing engine values.
//!
//! This module provides general-purpose helpers used throughout the
//! retime-core library: duration and byte formatting, and parsing of the
//! timestamp and size notations ffmpeg prints in its progress lines.

use serde::Serializer;
use std::time::Duration;

/// Formats a duration as HH:MM:SS (e.g., 3725s -> "01:02:05"). Fractions are truncated.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses an ffmpeg timestamp (`HH:MM:SS[.frac]`) into a `Duration`.
///
/// Negative timestamps, which ffmpeg prints for the first frames of some
/// inputs, clamp to zero. Returns `None` for anything else that is not a
/// well-formed timestamp, including `N/A`.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<Duration> {
    let time = time.trim();
    if let Some(magnitude) = time.strip_prefix('-') {
        return parse_ffmpeg_time(magnitude).map(|_| Duration::ZERO);
    }

    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours = parse_digits(parts[0])?;
    let minutes = parse_digits(parts[1])?;
    let (whole, fraction) = match parts[2].split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (parts[2], ""),
    };
    let seconds = parse_digits(whole)?;

    let mut nanos = 0u32;
    if !fraction.is_empty() {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Keep nanosecond precision at most; pad shorter fractions
        let digits: String = fraction.chars().take(9).collect();
        nanos = format!("{digits:0<9}").parse().ok()?;
    }

    let total = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    Some(Duration::new(total.checked_add(seconds)?, nanos))
}

/// Parses a size such as `1024kB`, `12.5MiB` or `380B` into bytes.
///
/// ffmpeg's `kB` and `mB` are binary multiples, like `KiB` and `MiB`.
#[must_use]
pub fn parse_size_bytes(size: &str) -> Option<u64> {
    let size = size.trim();
    let split = size
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    if number.is_empty() {
        return None;
    }

    let value: f64 = number.parse().ok()?;
    let multiplier: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * multiplier).round() as u64)
}

/// Last non-blank line of an engine's diagnostic output, trimmed.
///
/// Both `\r` and `\n` end a line, as ffmpeg rewrites its status line in place.
#[must_use]
pub fn last_diagnostic_line(text: &str) -> Option<&str> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .rfind(|line| !line.is_empty())
}

/// Serializes a `Duration` as fractional seconds.
pub(crate) fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "00:00:00");
        assert_eq!(format_duration(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_duration(Duration::from_secs(3600)), "01:00:00");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_duration(Duration::from_secs(90061)), "25:01:01");

        // Test fractional seconds (should truncate)
        assert_eq!(format_duration(Duration::from_secs_f64(49.713)), "00:00:49");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn test_parse_ffmpeg_time() {
        assert_eq!(parse_ffmpeg_time("00:00:41.23"), Some(Duration::from_millis(41_230)));
        assert_eq!(parse_ffmpeg_time("01:30:45"), Some(Duration::from_secs(5445)));
        assert_eq!(parse_ffmpeg_time("00:05:30.5"), Some(Duration::from_millis(330_500)));
        assert_eq!(parse_ffmpeg_time("00:00:24.860000"), Some(Duration::from_millis(24_860)));
        assert_eq!(parse_ffmpeg_time("-00:00:00.04"), Some(Duration::ZERO));

        assert_eq!(parse_ffmpeg_time("N/A"), None);
        assert_eq!(parse_ffmpeg_time("invalid"), None);
        assert_eq!(parse_ffmpeg_time("00:00"), None);
        assert_eq!(parse_ffmpeg_time("00:aa:10"), None);
        assert_eq!(parse_ffmpeg_time("00:00:10.x5"), None);
    }

    #[test]
    fn test_last_diagnostic_line() {
        let stderr = "Input #0\nframe=  1 fps=0.0\rframe=  2 fps=0.0\nConversion failed!\n\n";
        assert_eq!(last_diagnostic_line(stderr), Some("Conversion failed!"));
        assert_eq!(last_diagnostic_line(" \r\n "), None);
    }

    #[test]
    fn test_parse_size_bytes() {
        assert_eq!(parse_size_bytes("0kB"), Some(0));
        assert_eq!(parse_size_bytes("123kB"), Some(123 * 1024));
        assert_eq!(parse_size_bytes("256KiB"), Some(256 * 1024));
        assert_eq!(parse_size_bytes("2mB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size_bytes("1.5MiB"), Some(1_572_864));
        assert_eq!(parse_size_bytes("380B"), Some(380));
        assert_eq!(parse_size_bytes("42"), Some(42));

        assert_eq!(parse_size_bytes("N/A"), None);
        assert_eq!(parse_size_bytes("kB"), None);
        assert_eq!(parse_size_bytes("12parsecs"), None);
    }
}
